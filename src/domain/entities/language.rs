use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the assistant answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
    Fr,
    It,
}

const DE_KEYWORDS: &[&str] = &[
    "grüezi", "gruezi", "hallo", "guten", "danke", "bitte", "tschüss", "servus", "hoi", "salü",
    "sali",
];
const FR_KEYWORDS: &[&str] = &["bonjour", "salut", "bonsoir", "merci", "s'il vous plaît", "svp"];
const IT_KEYWORDS: &[&str] = &["ciao", "buongiorno", "buonasera", "grazie", "per favore"];

const DE_CHARS: &str = "äöüß";
const FR_CHARS: &str = "éèêàçùûîôëïœ";
const IT_CHARS: &str = "àèéìîòóù";

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::De, Language::Fr, Language::It];

    /// Keyword hints first, then characters typical of each language.
    pub fn detect(text: &str) -> Self {
        let normalized = normalize(text);
        let has_keyword = |words: &[&str]| words.iter().any(|w| contains_phrase(&normalized, w));

        if has_keyword(DE_KEYWORDS) {
            return Self::De;
        }
        if has_keyword(FR_KEYWORDS) {
            return Self::Fr;
        }
        if has_keyword(IT_KEYWORDS) {
            return Self::It;
        }

        let lower = text.to_lowercase();
        let has_char = |chars: &str| lower.chars().any(|c| chars.contains(c));
        if has_char(DE_CHARS) {
            Self::De
        } else if has_char(FR_CHARS) {
            Self::Fr
        } else if has_char(IT_CHARS) {
            Self::It
        } else {
            Self::En
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Fr => "fr",
            Self::It => "it",
        }
    }

    /// How the answer language is named in the synthesis prompt.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::De => "German (Swiss professional tone)",
            Self::Fr => "French (Swiss professional tone)",
            Self::It => "Italian (Swiss professional tone)",
        }
    }

    pub fn fallback_message(&self, contact: &str) -> String {
        match self {
            Self::En => format!("I'm not fully sure - please contact HR at {contact}"),
            Self::De => format!(
                "Ich bin nicht ganz sicher – bitte wenden Sie sich an HR unter {contact}."
            ),
            Self::Fr => format!("Je ne suis pas totalement sûr — veuillez contacter les RH à {contact}."),
            Self::It => format!("Non sono del tutto sicuro — contatti le Risorse Umane a {contact}."),
        }
    }

    /// Canned reply for greetings, thanks and goodbyes in this language's
    /// vocabulary, or `None` when the text needs a real answer.
    pub fn small_talk_reply(&self, text: &str) -> Option<&'static str> {
        let normalized = normalize(text);
        let vocabulary = SmallTalk::for_language(*self);

        if vocabulary
            .greetings
            .iter()
            .any(|w| starts_with_phrase(&normalized, w))
        {
            return Some(vocabulary.greeting_reply);
        }
        if vocabulary
            .thanks
            .iter()
            .any(|w| contains_phrase(&normalized, w))
        {
            return Some(vocabulary.thanks_reply);
        }
        if vocabulary
            .goodbyes
            .iter()
            .any(|w| starts_with_phrase(&normalized, w))
        {
            return Some(vocabulary.goodbye_reply);
        }
        None
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

struct SmallTalk {
    greetings: &'static [&'static str],
    thanks: &'static [&'static str],
    goodbyes: &'static [&'static str],
    greeting_reply: &'static str,
    thanks_reply: &'static str,
    goodbye_reply: &'static str,
}

impl SmallTalk {
    fn for_language(language: Language) -> Self {
        match language {
            Language::En => Self {
                greetings: &[
                    "hi",
                    "hello",
                    "hey",
                    "good morning",
                    "good afternoon",
                    "good evening",
                ],
                thanks: &["thanks", "thank you", "thx", "ty"],
                goodbyes: &["bye", "goodbye", "see you", "see ya"],
                greeting_reply: "Hello — how can I help you today?",
                thanks_reply: "You're welcome. How else can I assist?",
                goodbye_reply: "Goodbye. If anything comes up, feel free to ask.",
            },
            Language::De => Self {
                greetings: &[
                    "grüezi",
                    "gruezi",
                    "hallo",
                    "guten morgen",
                    "guten tag",
                    "guten abend",
                    "hoi",
                    "salü",
                    "sali",
                ],
                thanks: &["danke", "dankeschön", "merci"],
                goodbyes: &["tschüss", "auf wiedersehen"],
                greeting_reply: "Grüezi — wie kann ich Ihnen helfen?",
                thanks_reply: "Gern geschehen. Womit kann ich sonst helfen?",
                goodbye_reply: "Auf Wiedersehen. Bei Fragen melden Sie sich gerne.",
            },
            Language::Fr => Self {
                greetings: &["bonjour", "salut", "bonsoir"],
                thanks: &["merci"],
                goodbyes: &["au revoir"],
                greeting_reply: "Bonjour — comment puis-je vous aider?",
                thanks_reply: "Je vous en prie. Puis-je vous aider autrement?",
                goodbye_reply: "Au revoir. En cas de besoin, n'hésitez pas à me solliciter.",
            },
            Language::It => Self {
                greetings: &["ciao", "buongiorno", "buonasera"],
                thanks: &["grazie"],
                goodbyes: &["arrivederci", "ciao"],
                greeting_reply: "Buongiorno — come posso aiutarla?",
                thanks_reply: "Prego. In cos'altro posso aiutarla?",
                goodbye_reply: "Arrivederci. Se serve altro, sono a disposizione.",
            },
        }
    }
}

/// Lowercased words separated by single spaces, padded with a space on both
/// ends so phrases can be matched on word boundaries.
fn normalize(text: &str) -> String {
    let lower = text.to_lowercase().replace('\u{2019}', "'");
    let cleaned: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {phrase} "))
}

fn starts_with_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.starts_with(&format!(" {phrase} "))
}
