//! Dictionary-and-suffix lemmatizer for English.
//!
//! Irregular forms come from small lookup tables; everything else goes
//! through suffix rules keyed on the coarse part of speech. The pattern
//! database already lists inflected word forms for every constant, so the
//! lemma is only a second chance for forms the database missed.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::linguistics::{PartOfSpeech, normalize_word};

/// Irregular verb forms mapped to their lemma.
static IRREGULAR_VERBS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let table: &[(&str, &[&str])] = &[
        ("be", &["am", "is", "are", "was", "were", "been", "being", "'m", "'re"]),
        ("have", &["has", "had", "having", "'ve"]),
        ("do", &["does", "did", "done", "doing"]),
        ("go", &["goes", "went", "gone", "going"]),
        ("will", &["'ll", "wo"]),
        ("would", &["'d"]),
        ("can", &["ca"]),
        ("arise", &["arose", "arisen"]),
        ("awake", &["awoke", "awoken"]),
        ("bear", &["bore", "borne", "born"]),
        ("beat", &["beaten"]),
        ("become", &["became"]),
        ("begin", &["began", "begun", "beginning"]),
        ("bend", &["bent"]),
        ("bet", &["betting"]),
        ("bind", &["bound"]),
        ("bite", &["bit", "bitten"]),
        ("bleed", &["bled"]),
        ("blow", &["blew", "blown"]),
        ("break", &["broke", "broken"]),
        ("bring", &["brought"]),
        ("build", &["built"]),
        ("burn", &["burnt"]),
        ("buy", &["bought"]),
        ("catch", &["caught"]),
        ("choose", &["chose", "chosen"]),
        ("cling", &["clung"]),
        ("come", &["came"]),
        ("creep", &["crept"]),
        ("cut", &["cutting"]),
        ("deal", &["dealt"]),
        ("dig", &["dug"]),
        ("draw", &["drew", "drawn"]),
        ("dream", &["dreamt"]),
        ("drink", &["drank", "drunk"]),
        ("drive", &["drove", "driven"]),
        ("eat", &["ate", "eaten"]),
        ("fall", &["fell", "fallen"]),
        ("feed", &["fed"]),
        ("feel", &["felt"]),
        ("fight", &["fought"]),
        ("find", &["found"]),
        ("flee", &["fled"]),
        ("fling", &["flung"]),
        ("fly", &["flew", "flown", "flies"]),
        ("forbid", &["forbade", "forbidden"]),
        ("forget", &["forgot", "forgotten"]),
        ("forgive", &["forgave", "forgiven"]),
        ("freeze", &["froze", "frozen"]),
        ("get", &["got", "gotten", "getting"]),
        ("give", &["gave", "given"]),
        ("grind", &["ground"]),
        ("grow", &["grew", "grown"]),
        ("hang", &["hung"]),
        ("hear", &["heard"]),
        ("hide", &["hid", "hidden"]),
        ("hit", &["hitting"]),
        ("hold", &["held"]),
        ("keep", &["kept"]),
        ("kneel", &["knelt"]),
        ("know", &["knew", "known"]),
        ("lay", &["laid"]),
        ("lead", &["led"]),
        ("lean", &["leant"]),
        ("leap", &["leapt"]),
        ("learn", &["learnt"]),
        ("leave", &["left"]),
        ("lend", &["lent"]),
        ("let", &["letting"]),
        ("lie", &["lay", "lain", "lying"]),
        ("light", &["lit"]),
        ("lose", &["lost"]),
        ("make", &["made"]),
        ("mean", &["meant"]),
        ("meet", &["met"]),
        ("pay", &["paid"]),
        ("put", &["putting"]),
        ("quit", &["quitting"]),
        ("read", &["reading"]),
        ("ride", &["rode", "ridden"]),
        ("ring", &["rang", "rung"]),
        ("rise", &["rose", "risen"]),
        ("run", &["ran", "running"]),
        ("say", &["said"]),
        ("see", &["saw", "seen"]),
        ("seek", &["sought"]),
        ("sell", &["sold"]),
        ("send", &["sent"]),
        ("set", &["setting"]),
        ("shake", &["shook", "shaken"]),
        ("shine", &["shone"]),
        ("shoot", &["shot"]),
        ("show", &["shown"]),
        ("shrink", &["shrank", "shrunk"]),
        ("shut", &["shutting"]),
        ("sing", &["sang", "sung"]),
        ("sink", &["sank", "sunk"]),
        ("sit", &["sat", "sitting"]),
        ("sleep", &["slept"]),
        ("slide", &["slid"]),
        ("speak", &["spoke", "spoken"]),
        ("spend", &["spent"]),
        ("spill", &["spilt"]),
        ("spin", &["spun"]),
        ("spit", &["spat"]),
        ("split", &["splitting"]),
        ("spread", &["spreading"]),
        ("spring", &["sprang", "sprung"]),
        ("stand", &["stood"]),
        ("steal", &["stole", "stolen"]),
        ("stick", &["stuck"]),
        ("sting", &["stung"]),
        ("strike", &["struck", "stricken"]),
        ("swear", &["swore", "sworn"]),
        ("sweep", &["swept"]),
        ("swim", &["swam", "swum"]),
        ("swing", &["swung"]),
        ("take", &["took", "taken"]),
        ("teach", &["taught"]),
        ("tear", &["tore", "torn"]),
        ("tell", &["told"]),
        ("think", &["thought"]),
        ("throw", &["threw", "thrown"]),
        ("tread", &["trod", "trodden"]),
        ("understand", &["understood"]),
        ("wake", &["woke", "woken"]),
        ("wear", &["wore", "worn"]),
        ("weep", &["wept"]),
        ("win", &["won", "winning"]),
        ("wind", &["wound"]),
        ("withdraw", &["withdrew", "withdrawn"]),
        ("write", &["wrote", "written"]),
    ];

    let mut map = HashMap::new();
    for (lemma, forms) in table {
        for form in *forms {
            map.insert(*form, *lemma);
        }
    }
    map
});

/// Verb lemmas the tagger recognizes as verbs and the suffix rules use to
/// restore a dropped final `e` (`making` -> `make`).
static KNOWN_VERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set: HashSet<&'static str> = IRREGULAR_VERBS.values().copied().collect();
    set.extend([
        "accept", "accustom", "add", "agree", "allow", "answer", "appear", "argue", "arrive",
        "ask", "bake", "believe", "belong", "blame", "borrow", "call", "care", "carry", "change",
        "charge", "chase", "check", "clean", "close", "count", "cover", "cross", "cry", "dance",
        "decide", "die", "drop", "dye", "end", "enjoy", "explain", "face", "fill", "finish",
        "fire", "fix", "follow", "force", "guess", "happen", "hate", "help", "hire", "hope",
        "hurry", "improve", "invite", "join", "judge", "jump", "kick", "kill", "kiss", "laugh",
        "like", "listen", "live", "look", "love", "manage", "marry", "matter", "miss", "move",
        "need", "notice", "offer", "open", "own", "pass", "pick", "place", "plan", "play",
        "please", "prefer", "prepare", "promise", "prove", "pull", "push", "raise", "reach",
        "realize", "receive", "remember", "rescue", "rest", "return", "save", "seem", "serve",
        "settle", "share", "shave", "smile", "start", "stay", "stop", "stare", "study", "suppose",
        "talk", "taste", "thank", "tie", "tire", "touch", "travel", "trust", "try", "turn", "use",
        "wait", "walk", "want", "wash", "waste", "watch", "wish", "wonder", "work", "worry",
    ]);
    set
});

/// Irregular noun plurals mapped to their singular.
static IRREGULAR_NOUNS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("mice", "mouse"),
        ("geese", "goose"),
        ("people", "person"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("halves", "half"),
        ("selves", "self"),
        ("shelves", "shelf"),
        ("wolves", "wolf"),
        ("oxen", "ox"),
        ("dice", "die"),
    ])
});

static IRREGULAR_ADJECTIVES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("better", "good"),
        ("best", "good"),
        ("worse", "bad"),
        ("worst", "bad"),
        ("further", "far"),
        ("farther", "far"),
        ("more", "much"),
        ("most", "much"),
        ("less", "little"),
        ("least", "little"),
    ])
});

/// Returns true if the word is a known verb lemma or irregular verb form.
pub fn is_known_verb(word: &str) -> bool {
    KNOWN_VERBS.contains(word) || IRREGULAR_VERBS.contains_key(word)
}

/// Reduce a word to its lemma given its coarse part of speech.
pub fn lemmatize(word: &str, pos: PartOfSpeech) -> String {
    let lower = normalize_word(word);

    match lower.as_str() {
        "n't" => return "not".to_string(),
        "'s" => {
            return match pos {
                PartOfSpeech::Verb | PartOfSpeech::Auxiliary => "be".to_string(),
                _ => lower,
            };
        }
        _ => {}
    }

    match pos {
        PartOfSpeech::Verb | PartOfSpeech::Auxiliary => verb_lemma(&lower),
        PartOfSpeech::Noun => noun_lemma(&lower),
        PartOfSpeech::Adjective => IRREGULAR_ADJECTIVES
            .get(lower.as_str())
            .map(|s| s.to_string())
            .unwrap_or(lower),
        _ => lower,
    }
}

fn verb_lemma(word: &str) -> String {
    if let Some(lemma) = IRREGULAR_VERBS.get(word) {
        return lemma.to_string();
    }
    if KNOWN_VERBS.contains(word) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies").filter(|s| s.len() > 1) {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("ied").filter(|s| s.len() > 1) {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("ing").filter(|s| s.len() > 1) {
        return restore_stem(stem);
    }
    if let Some(stem) = word.strip_suffix("ed").filter(|s| s.len() > 1) {
        return restore_stem(stem);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes", "oes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s')
        && !stem.ends_with('s')
        && stem.len() > 1
    {
        return stem.to_string();
    }

    word.to_string()
}

/// Undo consonant doubling or a dropped final `e` after stripping -ing/-ed.
fn restore_stem(stem: &str) -> String {
    if KNOWN_VERBS.contains(stem) {
        return stem.to_string();
    }

    let with_e = format!("{stem}e");
    if KNOWN_VERBS.contains(with_e.as_str()) {
        return with_e;
    }

    let bytes = stem.as_bytes();
    if bytes.len() >= 3 {
        let last = bytes[bytes.len() - 1];
        let previous = bytes[bytes.len() - 2];
        if last == previous && !matches!(last, b'l' | b's' | b'z') && !is_vowel(last) {
            return stem[..stem.len() - 1].to_string();
        }
    }

    stem.to_string()
}

fn noun_lemma(word: &str) -> String {
    if let Some(singular) = IRREGULAR_NOUNS.get(word) {
        return singular.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies").filter(|s| s.len() > 1) {
        return format!("{stem}y");
    }
    for suffix in ["sses", "shes", "ches", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s')
        && stem.len() > 1
    {
        return stem.to_string();
    }

    word.to_string()
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}
