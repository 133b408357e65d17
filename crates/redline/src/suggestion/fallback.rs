//! Rule-based rewrites used when generation is unavailable.
//!
//! Every rule family is a fixed pattern table. The family matching the issue
//! type is tried first, then every other family. When nothing applies the
//! sentence is wrapped in a "needs revision" marker, so the output never
//! equals the input.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::issue::{FlaggedIssue, IssueType};

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

static PASSIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<object>.+?)\s+(?P<aux>has been|have been|had been|was|were|is|are)\s+(?P<participle>[a-z]+)\s+by\s+(?P<agent>[^,;]+?)(?P<tail>[,;].*)?$",
    )
    .unwrap()
});

static CLAUSE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),\s+(and|but|so|or|yet)\s+|;\s+").unwrap());

static WEAK_MODIFIERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:very|really|quite|rather|somewhat|basically|actually|extremely|totally|fairly|literally|definitely|certainly|essentially|simply|perhaps|possibly)\s+",
    )
    .unwrap()
});

static WORDY_PHRASES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("it is important to note that", ""),
        ("it should be noted that", ""),
        ("due to the fact that", "because"),
        ("owing to the fact that", "because"),
        ("in spite of the fact that", "although"),
        ("despite the fact that", "although"),
        ("at this point in time", "now"),
        ("at the present time", "now"),
        ("in the event that", "if"),
        ("in order to", "to"),
        ("a large number of", "many"),
        ("a majority of", "most"),
        ("for the purpose of", "for"),
        ("has the ability to", "can"),
        ("have the ability to", "can"),
        ("is able to", "can"),
        ("are able to", "can"),
        ("in the near future", "soon"),
        ("with regard to", "about"),
        ("with respect to", "about"),
        ("in regard to", "about"),
        ("prior to", "before"),
        ("subsequent to", "after"),
        ("in close proximity to", "near"),
        ("on a daily basis", "daily"),
        ("made a decision to", "decided to"),
        ("make a decision to", "decide to"),
        ("conduct an investigation into", "investigate"),
        ("give consideration to", "consider"),
        ("take into consideration", "consider"),
        ("each and every", "every"),
        ("first and foremost", "first"),
        ("end result", "result"),
        ("final outcome", "outcome"),
        ("past history", "history"),
        ("future plans", "plans"),
        ("completely finished", "finished"),
        ("basic fundamentals", "fundamentals"),
        ("advance planning", "planning"),
        ("unexpected surprise", "surprise"),
        ("free gift", "gift"),
    ]
    .into_iter()
    .map(|(phrase, replacement)| {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase));
        (Regex::new(&pattern).unwrap(), replacement)
    })
    .collect()
});

static CONTRACTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bcan['’]t\b", "cannot"),
        (r"\bwon['’]t\b", "will not"),
        (r"\bshan['’]t\b", "shall not"),
        (r"\blet['’]s\b", "let us"),
        (r"\b(it|that|there|what|here|who)['’]s\b", "$1 is"),
        (r"\bi['’]m\b", "I am"),
        (r"\b(you|we|they)['’]re\b", "$1 are"),
        (r"\b(i|you|we|they)['’]ve\b", "$1 have"),
        (r"\b(i|you|we|they|it|he|she)['’]ll\b", "$1 will"),
        (r"\b(i|you|we|they|he|she)['’]d\b", "$1 would"),
        (r"\b(\w+)n['’]t\b", "$1 not"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(&format!("(?i){}", pattern)).unwrap(), replacement))
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,.;:!?])").unwrap());

/// Participles whose simple past differs from the participle.
const IRREGULAR_PAST: &[(&str, &str)] = &[
    ("written", "wrote"),
    ("done", "did"),
    ("given", "gave"),
    ("taken", "took"),
    ("seen", "saw"),
    ("known", "knew"),
    ("shown", "showed"),
    ("chosen", "chose"),
    ("driven", "drove"),
    ("eaten", "ate"),
    ("broken", "broke"),
    ("spoken", "spoke"),
    ("begun", "began"),
    ("drawn", "drew"),
    ("grown", "grew"),
    ("thrown", "threw"),
    ("forgotten", "forgot"),
    ("hidden", "hid"),
    ("ridden", "rode"),
    ("stolen", "stole"),
    ("frozen", "froze"),
    ("woken", "woke"),
    ("worn", "wore"),
    ("torn", "tore"),
    ("sworn", "swore"),
    ("undertaken", "undertook"),
    ("overseen", "oversaw"),
    ("rewritten", "rewrote"),
    ("sung", "sang"),
    ("rung", "rang"),
    ("flown", "flew"),
    ("blown", "blew"),
];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "our", "its", "his", "her", "their",
    "my", "your", "some", "many", "all", "each", "every", "several", "most", "no",
];

/// Subject ↔ object pronoun pairs.
const PRONOUNS: &[(&str, &str)] = &[
    ("i", "me"),
    ("he", "him"),
    ("she", "her"),
    ("we", "us"),
    ("they", "them"),
];

/// Prepositions that end the agent phrase of a passive clause.
const AGENT_BOUNDARIES: &[&str] = &[
    " in ", " on ", " at ", " during ", " for ", " after ", " before ", " with ", " since ",
    " last ", " yesterday", " today",
];

// =============================================================================
// REWRITE RULES
// =============================================================================

/// A rule family in the fallback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteRule {
    PassiveToActive,
    TrimWordyPhrases,
    DropWeakModifiers,
    ExpandContractions,
    SplitLongSentence,
}

impl RewriteRule {
    /// Order used for the catch-all pass.
    pub const ALL: [RewriteRule; 5] = [
        RewriteRule::PassiveToActive,
        RewriteRule::TrimWordyPhrases,
        RewriteRule::DropWeakModifiers,
        RewriteRule::ExpandContractions,
        RewriteRule::SplitLongSentence,
    ];

    /// Rule family targeted at an issue type, if any.
    pub fn for_issue(issue_type: &IssueType) -> Option<RewriteRule> {
        if issue_type.mentions(&["passive"]) {
            Some(RewriteRule::PassiveToActive)
        } else if issue_type.mentions(&["long", "run on", "length"]) {
            Some(RewriteRule::SplitLongSentence)
        } else if issue_type.mentions(&["contraction", "informal"]) {
            Some(RewriteRule::ExpandContractions)
        } else if issue_type.mentions(&["modifier", "intensifier", "hedg", "qualifier", "weak"]) {
            Some(RewriteRule::DropWeakModifiers)
        } else if issue_type.mentions(&[
            "wordy",
            "wordiness",
            "redundan",
            "concise",
            "verbose",
            "filler",
            "nominali",
        ]) {
            Some(RewriteRule::TrimWordyPhrases)
        } else {
            None
        }
    }

    /// Human-readable description of what the rule did.
    pub fn describe(&self) -> &'static str {
        match self {
            RewriteRule::PassiveToActive => "Restructured the passive clause so the actor is the subject.",
            RewriteRule::TrimWordyPhrases => "Replaced wordy phrases with shorter equivalents.",
            RewriteRule::DropWeakModifiers => "Removed weak modifiers and hedges.",
            RewriteRule::ExpandContractions => "Expanded contractions for a formal register.",
            RewriteRule::SplitLongSentence => "Split the sentence at the clause boundary nearest its middle.",
        }
    }

    /// Apply the rule. Returns `None` when the pattern does not match.
    pub fn apply(&self, sentence: &str) -> Option<String> {
        let rewritten = match self {
            RewriteRule::PassiveToActive => passive_to_active(sentence)?,
            RewriteRule::TrimWordyPhrases => replace_all(sentence, &WORDY_PHRASES),
            RewriteRule::DropWeakModifiers => WEAK_MODIFIERS.replace_all(sentence, "").into_owned(),
            RewriteRule::ExpandContractions => expand_contractions(sentence),
            RewriteRule::SplitLongSentence => split_long_sentence(sentence)?,
        };

        if rewritten.trim() == sentence.trim() {
            return None;
        }
        let tidied = tidy(&rewritten);
        (!tidied.is_empty() && tidied != sentence.trim()).then_some(tidied)
    }
}

/// Result of a fallback rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// The rewritten text.
    pub text: String,
    /// Rule that produced it; `None` for the generic revision marker.
    pub rule: Option<RewriteRule>,
}

/// Deterministic, pattern-table-driven rewriter.
pub struct FallbackRewriter;

impl FallbackRewriter {
    /// Rewrite a flagged sentence.
    pub fn rewrite(issue: &FlaggedIssue) -> String {
        Self::rewrite_detailed(issue).text
    }

    /// Rewrite a flagged sentence and report which rule applied.
    pub fn rewrite_detailed(issue: &FlaggedIssue) -> Rewrite {
        let sentence = issue.sentence.trim();
        let targeted = RewriteRule::for_issue(&issue.issue_type);

        let candidates = targeted
            .into_iter()
            .chain(RewriteRule::ALL.into_iter().filter(|r| Some(*r) != targeted));

        for rule in candidates {
            if let Some(text) = rule.apply(sentence) {
                return Rewrite {
                    text,
                    rule: Some(rule),
                };
            }
        }

        Rewrite {
            text: revision_marker(&issue.issue_type, sentence),
            rule: None,
        }
    }
}

fn revision_marker(issue_type: &IssueType, sentence: &str) -> String {
    if issue_type.as_str().is_empty() {
        format!("[Needs revision] {}", sentence)
    } else {
        format!("[Revise for {}] {}", issue_type, sentence)
    }
}

// =============================================================================
// PASSIVE VOICE
// =============================================================================

fn passive_to_active(sentence: &str) -> Option<String> {
    let (body, punct) = split_terminal_punctuation(sentence);
    let caps = PASSIVE.captures(body)?;

    let object = caps.name("object")?.as_str().trim();
    let aux = caps.name("aux")?.as_str().to_lowercase();
    let participle = caps.name("participle")?.as_str().to_lowercase();
    let agent_phrase = caps.name("agent")?.as_str().trim();
    let mut tail = caps.name("tail").map(|m| m.as_str()).unwrap_or("").to_string();

    let (agent, trailing) = split_agent(agent_phrase);
    if agent.is_empty() || object.is_empty() {
        return None;
    }
    if !trailing.is_empty() {
        tail = format!("{}{}", trailing, tail);
    }

    let plural = is_plural_agent(agent);
    let verb = match aux.as_str() {
        "was" | "were" => past_tense(&participle),
        "had been" => format!("had {}", participle),
        // Present passive has no reliable simple-present mapping; the perfect
        // keeps the sentence grammatical.
        _ => format!("{} {}", if plural { "have" } else { "has" }, participle),
    };

    Some(format!(
        "{} {} {}{}{}",
        capitalize(&subject_form(agent)),
        verb,
        object_form(object),
        tail,
        punct
    ))
}

fn split_agent(agent: &str) -> (&str, &str) {
    // ASCII lowering keeps byte offsets valid for slicing `agent`.
    let lower = agent.to_ascii_lowercase();
    let cut = AGENT_BOUNDARIES
        .iter()
        .filter_map(|b| lower.find(b))
        .min()
        .unwrap_or(agent.len());
    (agent[..cut].trim(), &agent[cut..])
}

fn past_tense(participle: &str) -> String {
    IRREGULAR_PAST
        .iter()
        .find(|(p, _)| *p == participle)
        .map(|(_, past)| past.to_string())
        .unwrap_or_else(|| participle.to_string())
}

fn is_plural_agent(agent: &str) -> bool {
    let lower = agent.to_lowercase();
    let first = lower.split_whitespace().next().unwrap_or("");
    let last = lower.split_whitespace().last().unwrap_or("");

    matches!(first, "we" | "they" | "you" | "i" | "us" | "them" | "me")
        || lower.contains(" and ")
        || (last.ends_with('s') && !last.ends_with("ss") && !last.ends_with("us") && !last.ends_with("is"))
}

fn subject_form(agent: &str) -> String {
    let lower = agent.to_lowercase();
    PRONOUNS
        .iter()
        .find(|(_, object)| *object == lower)
        .map(|(subject, _)| subject.to_string())
        .unwrap_or_else(|| agent.to_string())
}

fn object_form(object: &str) -> String {
    let lower = object.to_lowercase();
    if let Some((_, obj)) = PRONOUNS.iter().find(|(subject, _)| *subject == lower) {
        return obj.to_string();
    }
    if lower == "it" || lower == "you" {
        return lower;
    }

    let first_word = lower.split_whitespace().next().unwrap_or("");
    if DETERMINERS.contains(&first_word) {
        lowercase_first(object)
    } else {
        object.to_string()
    }
}

// =============================================================================
// LONG SENTENCES
// =============================================================================

fn split_long_sentence(sentence: &str) -> Option<String> {
    let (body, punct) = split_terminal_punctuation(sentence);
    let midpoint = body.len() / 2;

    let best = CLAUSE_BREAK
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let first = body[..whole.start()].trim();
            let second = body[whole.end()..].trim();
            let long_enough = first.split_whitespace().count() >= 3
                && second.split_whitespace().count() >= 3;
            long_enough.then(|| {
                let conjunction = caps.get(1).map(|m| m.as_str().to_lowercase());
                (whole.start().abs_diff(midpoint), first, second, conjunction)
            })
        })
        .min_by_key(|(distance, ..)| *distance)?;

    let (_, first, second, conjunction) = best;
    let lead = match conjunction.as_deref() {
        Some("but") => "However, ",
        Some("so") => "As a result, ",
        Some("or") => "Alternatively, ",
        Some("yet") => "Still, ",
        _ => "",
    };

    let second = if lead.is_empty() {
        capitalize(second)
    } else {
        format!("{}{}", lead, second)
    };

    Some(format!("{}. {}{}", first, second, punct))
}

// =============================================================================
// WORD-LEVEL TABLES
// =============================================================================

fn replace_all(sentence: &str, table: &[(Regex, &'static str)]) -> String {
    table.iter().fold(sentence.to_string(), |text, (pattern, replacement)| {
        pattern.replace_all(&text, *replacement).into_owned()
    })
}

fn expand_contractions(sentence: &str) -> String {
    CONTRACTIONS.iter().fold(sentence.to_string(), |text, (pattern, replacement)| {
        pattern
            .replace_all(&text, |caps: &Captures| {
                let mut expanded = String::new();
                caps.expand(replacement, &mut expanded);
                match_case(&caps[0], &expanded)
            })
            .into_owned()
    })
}

/// Carry the capitalization of the first letter of `original` onto `expanded`.
fn match_case(original: &str, expanded: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(|c| c.is_uppercase());
    if starts_upper {
        capitalize(expanded)
    } else if expanded.starts_with("I ") {
        expanded.to_string()
    } else {
        lowercase_first(expanded)
    }
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

fn split_terminal_punctuation(sentence: &str) -> (&str, &str) {
    let trimmed = sentence.trim();
    let body = trimmed.trim_end_matches(['.', '!', '?']);
    let punct = &trimmed[body.len()..];
    (body.trim_end(), if punct.is_empty() { "." } else { punct })
}

fn tidy(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    let spaced = SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1");
    let cleaned = spaced.trim_start_matches([',', ';', ' ']);
    capitalize(cleaned)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
