//! Pattern library: per-section expression tables, keywords and priorities.
//!
//! Tables are plain data. The detector never names a literal marker; adding
//! a script or a marker means adding rows here. Row order is significant:
//! the matcher concatenates results in row order, so tag rows come first
//! and reordering rows changes tie-break outcomes.
//!
//! Every expression is compiled case-insensitive and multi-line. Labelled
//! markers (`Rules:`, `Task:` ...) use a word boundary instead of a line
//! anchor so inline labels in single-line prompts are still found.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::types::SectionKind;
use crate::error::{PromptError, Result};

/// How many matches an expression contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// At most the first match.
    First,
    /// Every non-overlapping match in document order.
    All,
}

/// A compiled expression plus its scan mode.
#[derive(Debug, Clone)]
pub struct PatternExpr {
    regex: Regex,
    scan: Scan,
}

impl PatternExpr {
    /// Compile `source` case-insensitive and multi-line.
    pub fn new(source: &str, scan: Scan) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|err| PromptError::InvalidPattern(format!("{source}: {err}")))?;
        Ok(Self { regex, scan })
    }

    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    #[must_use]
    pub const fn scan(&self) -> Scan {
        self.scan
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Detection rules for one section.
#[derive(Debug, Clone)]
pub struct PatternDefinition {
    kind: SectionKind,
    expressions: Vec<PatternExpr>,
    keywords: Vec<String>,
    tag_markers: Vec<String>,
    priority: u8,
}

impl PatternDefinition {
    /// Build a definition. An empty expression list is rejected: a section
    /// that can never match is a configuration mistake, not "nothing found".
    pub fn new(kind: SectionKind, expressions: Vec<PatternExpr>) -> Result<Self> {
        if expressions.is_empty() {
            return Err(PromptError::InvalidPattern(format!(
                "{kind} definition has no expressions"
            )));
        }
        Ok(Self {
            kind,
            expressions,
            keywords: Vec::new(),
            tag_markers: Vec::new(),
            priority: kind.priority(),
        })
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Opening-tag markers that identify an explicitly tagged match
    /// (`<task>`, `<context>` ...). Stored lower-case.
    #[must_use]
    pub fn with_tag_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_markers = markers
            .into_iter()
            .map(|m| m.into().to_lowercase())
            .collect();
        self
    }

    /// Append expressions after the existing ones.
    #[must_use]
    pub fn with_extra_expressions(mut self, extra: Vec<PatternExpr>) -> Self {
        self.expressions.extend(extra);
        self
    }

    fn from_table(table: &SectionTable) -> Result<Self> {
        let expressions = table
            .expressions
            .iter()
            .map(|(source, scan)| PatternExpr::new(source, *scan))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(table.kind, expressions)?
            .with_keywords(table.keywords.iter().copied())
            .with_tag_markers(table.tag_markers.iter().copied()))
    }

    #[must_use]
    pub const fn kind(&self) -> SectionKind {
        self.kind
    }

    #[must_use]
    pub fn expressions(&self) -> &[PatternExpr] {
        &self.expressions
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn tag_markers(&self) -> &[String] {
        &self.tag_markers
    }

    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.priority
    }

    /// Whether `text` contains one of this section's tag markers.
    #[must_use]
    pub fn is_tagged(&self, text: &str) -> bool {
        if self.tag_markers.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.tag_markers.iter().any(|marker| lower.contains(marker.as_str()))
    }

    /// Whether any expression matches `text`.
    #[must_use]
    pub fn matches_pattern(&self, text: &str) -> bool {
        self.expressions.iter().any(|expr| expr.regex.is_match(text))
    }

    /// Case-insensitive keyword containment.
    #[must_use]
    pub fn contains_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| lower.contains(&keyword.to_lowercase()))
    }
}

/// Which built-in table a library was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryTier {
    /// English markers and XML tags.
    #[default]
    Baseline,
    /// Baseline plus Chinese markers and extra English/XML variants.
    Enhanced,
}

impl fmt::Display for LibraryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Enhanced => f.write_str("enhanced"),
        }
    }
}

/// One definition per section, immutable after construction.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    tier: LibraryTier,
    // Indexed by `SectionKind::priority() - 1`.
    definitions: Vec<PatternDefinition>,
}

impl PatternLibrary {
    /// Assemble a library. Each section must be defined exactly once.
    pub fn new(tier: LibraryTier, definitions: Vec<PatternDefinition>) -> Result<Self> {
        let mut by_kind: BTreeMap<SectionKind, PatternDefinition> = BTreeMap::new();
        for definition in definitions {
            let kind = definition.kind();
            if by_kind.insert(kind, definition).is_some() {
                return Err(PromptError::InvalidPattern(format!(
                    "{kind} is defined more than once"
                )));
            }
        }
        if let Some(missing) = SectionKind::all().iter().find(|kind| !by_kind.contains_key(*kind)) {
            return Err(PromptError::InvalidPattern(format!(
                "library has no definition for {missing}"
            )));
        }
        Ok(Self {
            tier,
            definitions: by_kind.into_values().collect(),
        })
    }

    fn from_tables(tier: LibraryTier, tables: &[SectionTable]) -> Result<Self> {
        let definitions = tables
            .iter()
            .map(PatternDefinition::from_table)
            .collect::<Result<Vec<_>>>()?;
        Self::new(tier, definitions)
    }

    /// The shared baseline library.
    #[must_use]
    pub fn baseline() -> Arc<Self> {
        Arc::clone(&BASELINE)
    }

    /// The shared enhanced multilingual library.
    #[must_use]
    pub fn enhanced() -> Arc<Self> {
        Arc::clone(&ENHANCED)
    }

    #[must_use]
    pub fn for_tier(tier: LibraryTier) -> Arc<Self> {
        match tier {
            LibraryTier::Baseline => Self::baseline(),
            LibraryTier::Enhanced => Self::enhanced(),
        }
    }

    #[must_use]
    pub const fn tier(&self) -> LibraryTier {
        self.tier
    }

    #[must_use]
    pub fn get(&self, kind: SectionKind) -> &PatternDefinition {
        &self.definitions[usize::from(kind.priority() - 1)]
    }

    /// Definitions in canonical section order.
    pub fn definitions(&self) -> impl Iterator<Item = &PatternDefinition> {
        self.definitions.iter()
    }

    /// Copy of this library with extra expressions appended per section.
    pub fn with_extra_patterns(&self, extra: &BTreeMap<SectionKind, Vec<String>>) -> Result<Self> {
        let mut library = self.clone();
        for (kind, sources) in extra {
            let compiled = sources
                .iter()
                .map(|source| PatternExpr::new(source, Scan::All))
                .collect::<Result<Vec<_>>>()?;
            let slot = &mut library.definitions[usize::from(kind.priority() - 1)];
            *slot = slot.clone().with_extra_expressions(compiled);
        }
        Ok(library)
    }
}

static BASELINE: LazyLock<Arc<PatternLibrary>> = LazyLock::new(|| {
    Arc::new(
        PatternLibrary::from_tables(LibraryTier::Baseline, BASELINE_TABLES)
            .expect("valid baseline pattern tables"),
    )
});

static ENHANCED: LazyLock<Arc<PatternLibrary>> = LazyLock::new(|| {
    let tables: Vec<SectionTable> = BASELINE_TABLES
        .iter()
        .zip(ENHANCED_EXTRAS)
        .map(|(base, extra)| base.merged(extra))
        .collect();
    Arc::new(
        PatternLibrary::from_tables(LibraryTier::Enhanced, &tables)
            .expect("valid enhanced pattern tables"),
    )
});

// =============================================================================
// TABLES
// =============================================================================

struct SectionTable {
    kind: SectionKind,
    expressions: &'static [(&'static str, Scan)],
    keywords: &'static [&'static str],
    tag_markers: &'static [&'static str],
}

struct SectionExtras {
    // Inserted right after the base tag rows, before free-text rows.
    tags: &'static [(&'static str, Scan)],
    expressions: &'static [(&'static str, Scan)],
    keywords: &'static [&'static str],
    tag_markers: &'static [&'static str],
}

impl SectionTable {
    fn merged(&self, extra: &SectionExtras) -> Self {
        let base_tags = self
            .expressions
            .iter()
            .take_while(|(source, _)| source.starts_with('<'))
            .count();
        let (tags, free) = self.expressions.split_at(base_tags);
        let expressions: Vec<(&'static str, Scan)> = tags
            .iter()
            .chain(extra.tags)
            .chain(free)
            .chain(extra.expressions)
            .copied()
            .collect();
        let keywords: Vec<&'static str> = self.keywords.iter().chain(extra.keywords).copied().collect();
        let tag_markers: Vec<&'static str> = self
            .tag_markers
            .iter()
            .chain(extra.tag_markers)
            .copied()
            .collect();
        Self {
            kind: self.kind,
            expressions: Vec::leak(expressions),
            keywords: Vec::leak(keywords),
            tag_markers: Vec::leak(tag_markers),
        }
    }
}

const BASELINE_TABLES: &[SectionTable] = &[
    SectionTable {
        kind: SectionKind::Introduction,
        expressions: &[
            (r"<introduction>([\s\S]*?)</introduction>", Scan::First),
            (r"^you are (a|an) .+", Scan::First),
            (r"^act as (a|an) .+", Scan::First),
            (r"^your role is .+", Scan::First),
            (r"^as (a|an) .+", Scan::First),
            (r"^you're (a|an) .+", Scan::First),
        ],
        keywords: &["you are", "act as", "your role", "as a", "as an"],
        tag_markers: &["<introduction>"],
    },
    SectionTable {
        kind: SectionKind::Rules,
        expressions: &[
            (r"<rules>([\s\S]*?)</rules>", Scan::First),
            (r"<rule>([\s\S]*?)</rule>", Scan::All),
            (r"\brules?:\s*.+", Scan::All),
            (r"^(?:you )?(?:must|should|always|never)\s+.+", Scan::All),
            (r"^(?:do not|don't|avoid)\s+.+", Scan::All),
            (r"^(?:ensure|make sure|verify)\s+.+", Scan::All),
            (r"^important:\s*.+", Scan::All),
            (r"^critical:\s*.+", Scan::All),
            (r"^note:\s*.+", Scan::All),
            (r"^\d+\.\s+(?:must|should|always|never)\s+.+", Scan::All),
            (r"^-\s*(?:must|should|always|never|do not|don't|avoid|ensure)\s+.+", Scan::All),
        ],
        keywords: &[
            "rule:", "rules:", "must", "should", "always", "never", "do not", "don't", "avoid",
            "ensure", "make sure", "important:", "critical:",
        ],
        tag_markers: &["<rules>", "<rule>"],
    },
    SectionTable {
        kind: SectionKind::Context,
        expressions: &[
            (r"<context>([\s\S]*?)</context>", Scan::First),
            (r"<background>([\s\S]*?)</background>", Scan::First),
            (r"\bcontext:\s*.+", Scan::First),
            (r"\bbackground:\s*.+", Scan::First),
            (r"^given that\s+.+", Scan::First),
            (r"\bscenario:\s*.+", Scan::First),
            (r"^setting:\s*.+", Scan::First),
            (r"^situation:\s*.+", Scan::First),
        ],
        keywords: &["context:", "background:", "given that", "scenario:", "setting:", "situation:"],
        tag_markers: &["<context>", "<background>"],
    },
    SectionTable {
        kind: SectionKind::Examples,
        expressions: &[
            (r"<examples?>([\s\S]*?)</examples?>", Scan::All),
            (r"\bexamples?:\s*.+", Scan::All),
            (r"^for example,?\s*.+", Scan::All),
            (r"^e\.g\.?,?\s*.+", Scan::All),
            (r"^samples?:\s*.+", Scan::All),
            (r"^instances?:\s*.+", Scan::All),
            (r"input:\s*.+\s+output:\s*.+", Scan::All),
            (r"^(?:\d+\.\s+)?input:\s*.+", Scan::All),
        ],
        keywords: &[
            "example:", "examples:", "for example", "e.g.", "sample:", "samples:", "instance:",
            "input:", "output:",
        ],
        tag_markers: &["<examples>", "<example>"],
    },
    SectionTable {
        kind: SectionKind::OutputFormat,
        expressions: &[
            (r"<output[_\s]?format>([\s\S]*?)</output[_\s]?format>", Scan::First),
            (r"\boutput format:\s*.+", Scan::First),
            (r"\bresponse format:\s*.+", Scan::First),
            (r"^format (?:the output|your response) (?:as|in|using)\s+.+", Scan::First),
            (r"^return\s+.+\s+(?:as|in)\s+.+", Scan::First),
            (r"^provide (?:the )?result in\s+.+", Scan::First),
            (r"^structure your response (?:as|in)\s+.+", Scan::First),
            (r"^your (?:output|response) should be\s+.+", Scan::First),
        ],
        keywords: &[
            "output format:", "response format:", "format the output", "format your response",
            "return", "provide the result", "structure your response",
        ],
        tag_markers: &["<output"],
    },
    SectionTable {
        kind: SectionKind::Task,
        expressions: &[
            (r"<task>([\s\S]*?)</task>", Scan::First),
            (r"\btask:\s*.+", Scan::First),
            (r"^your task is\s+.+", Scan::First),
            (
                r"^please\s+(?:translate|analyze|generate|create|write|review|evaluate|summarize)\s+.+",
                Scan::First,
            ),
            (
                r"^(?:translate|analyze|generate|create|write|review|evaluate|summarize)\s+(?:the following|the|this)\s+.+",
                Scan::First,
            ),
            (r"^now,?\s+(?:please\s+)?(?:translate|analyze|generate|create)\s+.+", Scan::First),
        ],
        keywords: &[
            "task:", "your task", "please", "translate", "analyze", "generate", "create", "write",
            "review", "evaluate",
        ],
        tag_markers: &["<task>"],
    },
];

// Same section order as BASELINE_TABLES.
const ENHANCED_EXTRAS: &[SectionExtras] = &[
    SectionExtras {
        tags: &[],
        expressions: &[
            (r"\brole:\s*.+", Scan::First),
            (r"\bsystem:\s*.+", Scan::First),
            (r"^你是.+", Scan::First),
            (r"^你的角色是.+", Scan::First),
            (r"^你将扮演.+", Scan::First),
            (r"^作为一个.+", Scan::First),
            (r"^扮演.+角色", Scan::First),
            (r"^角色[:：]\s*.+", Scan::First),
            (r"^系统[:：]\s*.+", Scan::First),
        ],
        keywords: &[
            "role:", "system:", "你是", "你的角色", "扮演", "作为", "角色：", "角色:", "系统：",
            "系统:",
        ],
        tag_markers: &[],
    },
    SectionExtras {
        tags: &[(r"<constraints?>([\s\S]*?)</constraints?>", Scan::First)],
        expressions: &[
            (r"\bconstraints?:\s*.+", Scan::All),
            (r"\brequirements?:\s*.+", Scan::All),
            (r"\bguidelines?:\s*.+", Scan::All),
            (r"^(?:refrain from|check)\s+.+", Scan::All),
            (r"^warning:\s*.+", Scan::All),
            (r"^规则[:：]\s*.+", Scan::All),
            (r"^要求[:：]\s*.+", Scan::All),
            (r"^约束[:：]\s*.+", Scan::All),
            (r"^限制[:：]\s*.+", Scan::All),
            (r"^指南[:：]\s*.+", Scan::All),
            (r"^准则[:：]\s*.+", Scan::All),
            (r"^(?:必须|应该|务必|一定要|禁止|不要|不能|避免)\s*.+", Scan::All),
            (r"^\d+[、.．]\s*(?:必须|应该|务必|一定要|禁止|不要|不能|避免)\s*.+", Scan::All),
            (r"^-\s*(?:必须|应该|务必|一定要|禁止|不要|不能|避免)\s*.+", Scan::All),
            (r"^重要[:：]\s*.+", Scan::All),
            (r"^注意[:：]\s*.+", Scan::All),
            (r"^警告[:：]\s*.+", Scan::All),
        ],
        keywords: &[
            "constraint:", "requirement:", "guideline:", "warning:", "note:", "规则：", "规则:",
            "要求：", "要求:", "约束：", "约束:", "限制：", "限制:", "必须", "应该", "务必",
            "一定要", "禁止", "不要", "不能", "避免", "重要：", "重要:", "注意：", "注意:",
            "警告：", "警告:",
        ],
        tag_markers: &["<constraint"],
    },
    SectionExtras {
        tags: &[],
        expressions: &[
            (r"\boverview:\s*.+", Scan::First),
            (r"^背景[:：]\s*.+", Scan::First),
            (r"^上下文[:：]\s*.+", Scan::First),
            (r"^场景[:：]\s*.+", Scan::First),
            (r"^情境[:：]\s*.+", Scan::First),
            (r"^环境[:：]\s*.+", Scan::First),
            (r"^概述[:：]\s*.+", Scan::First),
            (r"^在.+的情况下", Scan::First),
        ],
        keywords: &[
            "overview:", "背景：", "背景:", "上下文：", "上下文:", "场景：", "场景:", "情境：",
            "情境:", "环境：", "环境:", "概述：", "概述:",
        ],
        tag_markers: &[],
    },
    SectionExtras {
        tags: &[],
        expressions: &[
            (r"^for instance,?\s*.+", Scan::All),
            (r"^such as[:：]?\s*.+", Scan::All),
            (r"^demonstrations?:\s*.+", Scan::All),
            (r"^(?:举)?例如[:：、,，]?\s*.+", Scan::All),
            (r"^(?:举)?例子[:：]?\s*.+", Scan::All),
            (r"^示例[:：]\s*.+", Scan::All),
            (r"^样例[:：]\s*.+", Scan::All),
            (r"^比如[:：、,，]?\s*.+", Scan::All),
            (r"^举例来说[:：、,，]?\s*.+", Scan::All),
            (r"^例[:：]\s*.+", Scan::All),
            (r"输入[:：]\s*.+\s+输出[:：]\s*.+", Scan::All),
            (r"^(?:\d+[、.．]\s*)?输入[:：]\s*.+", Scan::All),
        ],
        keywords: &[
            "for instance", "such as", "demonstration:", "例如", "举例", "比如", "示例：",
            "示例:", "样例：", "样例:", "举例来说", "例子：", "例子:", "例：", "例:", "输入：",
            "输入:", "输出：", "输出:",
        ],
        tag_markers: &[],
    },
    SectionExtras {
        tags: &[(r"<response[_\s]?format>([\s\S]*?)</response[_\s]?format>", Scan::First)],
        expressions: &[
            (r"^reply in\s+.+", Scan::First),
            (r"^answer in\s+.+", Scan::First),
            (r"^输出格式[:：]\s*.+", Scan::First),
            (r"^返回格式[:：]\s*.+", Scan::First),
            (r"^回答格式[:：]\s*.+", Scan::First),
            (r"^格式[:：]\s*.+", Scan::First),
            (r"^(?:请)?以.+格式(?:输出|返回|回答)", Scan::First),
            (r"^(?:请)?用.+格式(?:输出|返回|回答)", Scan::First),
            (r"^你的(?:输出|回答|返回)应该.+", Scan::First),
        ],
        keywords: &[
            "reply in", "answer in", "输出格式：", "输出格式:", "返回格式：", "返回格式:",
            "回答格式：", "回答格式:", "格式：", "格式:", "输出", "返回", "回答",
        ],
        tag_markers: &["<response"],
    },
    SectionExtras {
        tags: &[(r"<instruction>([\s\S]*?)</instruction>", Scan::First)],
        expressions: &[
            (r"\binstruction:\s*.+", Scan::First),
            (r"\bgoal:\s*.+", Scan::First),
            (r"\bobjective:\s*.+", Scan::First),
            (r"^任务[:：]\s*.+", Scan::First),
            (r"^你的任务是.+", Scan::First),
            (r"^指令[:：]\s*.+", Scan::First),
            (r"^目标[:：]\s*.+", Scan::First),
            (
                r"^(?:请|现在请|请你)\s*(?:翻译|分析|生成|创建|写|评审|评估|总结|处理).+",
                Scan::First,
            ),
            (
                r"^(?:翻译|分析|生成|创建|写|评审|评估|总结|处理)\s*(?:以下|下面|如下|这个|这段).+",
                Scan::First,
            ),
            (r"^现在[,，]?\s*(?:请)?(?:翻译|分析|生成|创建).+", Scan::First),
        ],
        keywords: &[
            "instruction:", "goal:", "objective:", "任务：", "任务:", "你的任务", "指令：",
            "指令:", "目标：", "目标:", "请", "请你", "翻译", "分析", "生成", "创建", "写",
            "评审", "评估", "总结", "处理", "现在",
        ],
        tag_markers: &["<instruction>"],
    },
];
