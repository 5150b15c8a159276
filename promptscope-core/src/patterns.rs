//! Shared lexical patterns
//!
//! Every regular expression the analyzers use is compiled once into a
//! [`PatternLibrary`] held in a process-wide static. The library is read-only
//! after initialisation and safe to share between threads.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{MetricsError, Result};

/// Technical vocabulary counted by the relevancy analyzer (substring match)
pub const RELEVANCY_TERMS: &[&str] = &[
    "function", "method", "class", "component", "api",
    "database", "server", "client", "state", "props",
    "hook", "effect", "context", "redux", "async",
    "promise", "callback", "event", "handler", "middleware",
    "data", "system", "process", "user", "file",
    "code", "app", "application", "web", "program",
];

/// Transition words and phrases, each matched as a whole word
pub const TRANSITION_WORDS: &[&str] = &[
    "however", "therefore", "consequently", "furthermore",
    "moreover", "in addition", "similarly", "conversely",
    "specifically", "for example", "as a result",
    "and", "also", "but", "or", "so", "because",
    "then", "thus", "hence", "yet", "still", "while",
    "although", "though", "since", "when", "where",
];

/// Phrases signalling that the main body of an answer has started
pub const MAIN_CONTENT_MARKERS: &[&str] = &[
    "here's how", "the solution", "to implement",
    "you can", "let me explain", "consists of",
    "is", "are", "has", "have", "will", "can",
    "should", "would", "uses", "works", "means",
];

/// Connectives that introduce an explanation
pub const EXPLANATION_PATTERNS: &[&str] = &[
    "because", "this means", "in other words",
    "specifically", "for instance", "namely",
    "as", "since", "so", "that", "which", "where",
    "when", "while", "if", "then", "thus",
];

/// Words that flag a detailed explanation
pub const DETAIL_MARKERS: &[&str] = &[
    "specifically", "in detail", "important to note",
    "key point", "crucial", "essential", "significant",
    "note", "remember", "notice", "consider", "understand",
    "basically", "fundamentally", "primarily", "mainly",
];

// Character classes with the semantics the scores were calibrated against:
// `\w`, `\d` and `\b` are ASCII-only, case folding never maps non-ASCII letters
// onto ASCII ones, whitespace is Unicode White_Space minus U+0085 plus U+FEFF,
// and `.` stops at every line terminator.
macro_rules! space {
    () => {
        r"[\s\x{FEFF}&&[^\x{85}]]"
    };
}

macro_rules! not_line_end {
    () => {
        r"[^\n\r\x{2028}\x{2029}]"
    };
}

macro_rules! line_start {
    () => {
        r"(?:^|[\n\r\x{2028}\x{2029}])"
    };
}

/// Syntax categories counted for explanation depth, one pattern per category
const TECHNICAL_ELEMENTS: &[&str] = &[
    r"(?-u)\b\w+\(\)",
    concat!(r"(?-u:\bnew)", space!(), r"+(?-u:\w+\b)"),
    r"(?-u)\b(async|await)\b",
    r"(?-u)\b(try|catch|finally)\b",
    r"(?-u)\b(import|export)\b",
    r"(?-u)\b(const|let|var)\b",
    r"(?-u)\b(function|class|interface)\b",
    r"(?-u)\b(if|else|switch|case)\b",
    r"(?-u)\b(for|while|do)\b",
    r"[\[\]{}()]",
];

static LIBRARY: LazyLock<std::result::Result<PatternLibrary, regex::Error>> =
    LazyLock::new(PatternLibrary::compile);

/// Compiled patterns shared by all analyzers
#[derive(Debug)]
pub struct PatternLibrary {
    // Shared
    pub(crate) code_block: Regex,
    pub(crate) sentence_break: Regex,
    pub(crate) word: Regex,

    // Accuracy
    pub(crate) measurement: Regex,
    pub(crate) citation: Regex,
    pub(crate) term_definition: Regex,
    pub(crate) accuracy_terms: Regex,
    pub(crate) inline_code: Regex,
    pub(crate) code_language: Regex,
    pub(crate) code_keyword: Regex,
    pub(crate) code_terminator: Regex,
    pub(crate) code_error_handling: Regex,
    pub(crate) code_comment: Regex,

    // Relevancy
    pub(crate) direct_answer: Regex,
    pub(crate) heading_line: Regex,
    pub(crate) bullet_line: Regex,
    pub(crate) topic_preface: Regex,
    pub(crate) elaboration: Regex,
    pub(crate) example_marker: Regex,
    pub(crate) deictic: Regex,

    // Coherence
    pub(crate) intro_marker: Regex,
    pub(crate) conclusion_marker: Regex,
    pub(crate) sequential_marker: Regex,
    pub(crate) transitions: Vec<Regex>,
    pub(crate) consistency_terms: Regex,

    // Completeness
    pub(crate) opener: Regex,
    pub(crate) closing: Regex,
    pub(crate) example_phrase: Regex,
    pub(crate) technical_elements: Vec<Regex>,
}

impl PatternLibrary {
    /// The process-wide library, compiled on first use
    pub fn global() -> Result<&'static PatternLibrary> {
        LIBRARY.as_ref().map_err(|e| {
            MetricsError::InternalComputationFailure(format!(
                "pattern library failed to compile: {}",
                e
            ))
        })
    }

    /// Compile a fresh library
    pub fn compile() -> std::result::Result<Self, regex::Error> {
        let transitions = TRANSITION_WORDS
            .iter()
            .map(|word| Regex::new(&format!(r"(?i-u)\b{}\b", regex::escape(word))))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let technical_elements = TECHNICAL_ELEMENTS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            code_block: Regex::new(r"```[\s\S]*?```")?,
            sentence_break: Regex::new(r"[.!?]+")?,
            word: Regex::new(r"(?-u)\b\w+\b")?,

            measurement: Regex::new(concat!(
                r"(?-u:\d+)(?:\.(?-u:\d+))?(?:%|",
                space!(),
                r"*(?:px|em|rem|ms|s|bytes|kb|mb|gb))",
            ))?,
            citation: Regex::new(concat!(
                r"\[",
                not_line_end!(),
                r"*?\]|\(https?://",
                not_line_end!(),
                r"*?\)",
            ))?,
            term_definition: Regex::new(concat!(
                r"(?-u:\b\w+\b)",
                space!(),
                r"+(?:is|means|refers to)",
                space!(),
                "+",
            ))?,
            accuracy_terms: Regex::new(
                r"(?i-u)\b(async|await|function|class|interface|component|props|state|effect|callback|memo|context|reducer|api|database|server|client)\b",
            )?,
            inline_code: Regex::new(r"`[^`]+`")?,
            code_language: Regex::new(
                r"```(javascript|typescript|jsx|tsx|python|java|cpp|ruby|go)",
            )?,
            code_keyword: Regex::new(r"(?-u)\b(function|class|const|let|var|import|export)\b")?,
            code_terminator: Regex::new(r"[{}\[\]()];")?,
            code_error_handling: Regex::new(concat!(
                "try",
                space!(),
                r"*\{[\s\S]*?\}",
                space!(),
                "*catch",
            ))?,
            code_comment: Regex::new(r"//|/\*|\*/|#")?,

            direct_answer: Regex::new(
                r"(?i-u)(?:here's|here is|to answer|in response|regarding|let|this|the)",
            )?,
            heading_line: Regex::new(concat!(line_start!(), "#+", space!()))?,
            bullet_line: Regex::new(concat!(line_start!(), "[-*]", space!()))?,
            topic_preface: Regex::new(concat!(
                r"^(?:to|regarding|about|concerning|for|in|the|this)",
                space!(),
                "+",
                not_line_end!(),
                "*?[,:]",
            ))?,
            elaboration: Regex::new(
                r"(?i-u)(?:additionally|furthermore|moreover|also|related|and|then|next)",
            )?,
            example_marker: Regex::new(
                r"(?i-u)(?:for example|such as|like|consider|here|case|scenario)",
            )?,
            deictic: Regex::new(r"(?i-u)(?:it|this|that|these|those|the|a|an)")?,

            intro_marker: Regex::new(
                r"(?i-u)^(first|initially|to begin|let's start|here|this|the|in|for)",
            )?,
            conclusion_marker: Regex::new(
                r"(?i-u)(finally|in conclusion|to summarize|in summary|therefore|thus|so|as|then)",
            )?,
            sequential_marker: Regex::new(
                r"(?i-u)\b(first|second|third|next|then|after|before|finally|and|also|additionally)\b",
            )?,
            transitions,
            consistency_terms: Regex::new(
                r"(?i-u)\b(function|method|component|api|server|client|data|system|user|code|app|web)\b",
            )?,

            opener: Regex::new(r"(?i-u)^(?:let's|to|first|here|regarding|this|the|in|for|about)")?,
            closing: Regex::new(
                r"(?i-u)(finally|in conclusion|to summarize|in summary|that's how|therefore|thus|so|as|then)",
            )?,
            example_phrase: Regex::new(
                r"(?i-u)(?:for example|such as|like|consider|here's an example|case|scenario)",
            )?,
            technical_elements,
        })
    }

    /// Number of sentences: pieces between runs of `.`, `!` or `?` that are not blank
    pub fn sentence_count(&self, text: &str) -> usize {
        self.sentence_break
            .split(text)
            .filter(|s| !s.chars().all(is_space))
            .count()
    }

    /// Word tokens of `text`, in order
    pub fn words<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.word.find_iter(text).map(|m| m.as_str())
    }
}

/// Paragraphs separated by a blank line. Always at least one element.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n").collect()
}

/// Number of sections when splitting on a blank line or on a newline that opens a
/// level 1-3 markdown heading.
pub fn section_count(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut sections = 1;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\n' {
            if bytes.get(i + 1) == Some(&b'\n') {
                sections += 1;
                i += 2;
                continue;
            }
            if opens_heading(&text[i + 1..]) {
                sections += 1;
            }
        }
        i += 1;
    }

    sections
}

fn opens_heading(rest: &str) -> bool {
    let hashes = rest.bytes().take_while(|&b| b == b'#').count();
    (1..=3).contains(&hashes)
        && rest[hashes..]
            .chars()
            .next()
            .is_some_and(is_space)
}

/// Whitespace as the `space!` class defines it
pub fn is_space(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{FEFF}'
}

/// Number of distinct `terms` contained in `lowered`
pub fn count_contained(lowered: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|term| lowered.contains(*term)).count()
}
