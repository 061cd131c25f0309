//! Porter stemming algorithm (M.F. Porter, 1980)
//!
//! Operates on lowercase ASCII words. Words containing anything else, and
//! words of two letters or fewer, are returned unchanged.

/// Reduces a word to its Porter stem
///
/// ```
/// use seo_ripple::analyzer::stem;
///
/// assert_eq!(stem("connections"), "connect");
/// assert_eq!(stem("running"), "run");
/// ```
pub fn stem(word: &str) -> String {
    if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }

    let mut w = word.as_bytes().to_vec();
    step1a(&mut w);
    step1b(&mut w);
    step1c(&mut w);
    step2(&mut w);
    step3(&mut w);
    step4(&mut w);
    step5a(&mut w);
    step5b(&mut w);

    // Only ASCII bytes were ever written
    String::from_utf8(w).unwrap_or_else(|_| word.to_string())
}

fn is_consonant(w: &[u8], i: usize) -> bool {
    match w[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(w, i - 1),
        _ => true,
    }
}

/// Number of VC sequences in `[C](VC)^m[V]`
fn measure(w: &[u8]) -> usize {
    let mut m = 0;
    let mut i = 0;
    let n = w.len();

    while i < n && is_consonant(w, i) {
        i += 1;
    }
    loop {
        while i < n && !is_consonant(w, i) {
            i += 1;
        }
        if i >= n {
            return m;
        }
        while i < n && is_consonant(w, i) {
            i += 1;
        }
        m += 1;
        if i >= n {
            return m;
        }
    }
}

fn has_vowel(w: &[u8]) -> bool {
    (0..w.len()).any(|i| !is_consonant(w, i))
}

fn ends_double_consonant(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_consonant(w, n - 1)
}

/// consonant-vowel-consonant ending, where the last consonant is not w, x or y
fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    n >= 3
        && is_consonant(w, n - 1)
        && !is_consonant(w, n - 2)
        && is_consonant(w, n - 3)
        && !matches!(w[n - 1], b'w' | b'x' | b'y')
}

fn stem_len(w: &[u8], suffix: &[u8]) -> Option<usize> {
    w.ends_with(suffix).then(|| w.len() - suffix.len())
}

fn replace_suffix(w: &mut Vec<u8>, stem_len: usize, replacement: &[u8]) {
    w.truncate(stem_len);
    w.extend_from_slice(replacement);
}

/// Applies the first rule whose suffix matches, if the stem measure exceeds
/// `min_measure`. Later rules are never tried once a suffix matched.
fn apply_rules(w: &mut Vec<u8>, rules: &[(&[u8], &[u8])], min_measure: usize) {
    for (suffix, replacement) in rules {
        if let Some(len) = stem_len(w, suffix) {
            if measure(&w[..len]) > min_measure {
                replace_suffix(w, len, replacement);
            }
            return;
        }
    }
}

fn step1a(w: &mut Vec<u8>) {
    if let Some(len) = stem_len(w, b"sses") {
        replace_suffix(w, len, b"ss");
    } else if let Some(len) = stem_len(w, b"ies") {
        replace_suffix(w, len, b"i");
    } else if w.ends_with(b"s") && !w.ends_with(b"ss") {
        w.pop();
    }
}

fn step1b(w: &mut Vec<u8>) {
    if let Some(len) = stem_len(w, b"eed") {
        if measure(&w[..len]) > 0 {
            replace_suffix(w, len, b"ee");
        }
        return;
    }

    let stripped = [b"ed".as_slice(), b"ing".as_slice()]
        .iter()
        .find_map(|suffix| stem_len(w, suffix).filter(|&len| has_vowel(&w[..len])));

    let Some(len) = stripped else {
        return;
    };
    w.truncate(len);

    if w.ends_with(b"at") || w.ends_with(b"bl") || w.ends_with(b"iz") {
        w.push(b'e');
    } else if ends_double_consonant(w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z') {
        w.pop();
    } else if measure(w) == 1 && ends_cvc(w) {
        w.push(b'e');
    }
}

fn step1c(w: &mut Vec<u8>) {
    if let Some(len) = stem_len(w, b"y") {
        if has_vowel(&w[..len]) {
            w[len] = b'i';
        }
    }
}

fn step2(w: &mut Vec<u8>) {
    const RULES: &[(&[u8], &[u8])] = &[
        (b"ational", b"ate"),
        (b"tional", b"tion"),
        (b"enci", b"ence"),
        (b"anci", b"ance"),
        (b"izer", b"ize"),
        (b"abli", b"able"),
        (b"alli", b"al"),
        (b"entli", b"ent"),
        (b"eli", b"e"),
        (b"ousli", b"ous"),
        (b"ization", b"ize"),
        (b"ation", b"ate"),
        (b"ator", b"ate"),
        (b"alism", b"al"),
        (b"iveness", b"ive"),
        (b"fulness", b"ful"),
        (b"ousness", b"ous"),
        (b"aliti", b"al"),
        (b"iviti", b"ive"),
        (b"biliti", b"ble"),
    ];
    apply_rules(w, RULES, 0);
}

fn step3(w: &mut Vec<u8>) {
    const RULES: &[(&[u8], &[u8])] = &[
        (b"icate", b"ic"),
        (b"ative", b""),
        (b"alize", b"al"),
        (b"iciti", b"ic"),
        (b"ical", b"ic"),
        (b"ful", b""),
        (b"ness", b""),
    ];
    apply_rules(w, RULES, 0);
}

fn step4(w: &mut Vec<u8>) {
    const SUFFIXES: &[&[u8]] = &[
        b"al", b"ance", b"ence", b"er", b"ic", b"able", b"ible", b"ant", b"ement", b"ment",
        b"ent", b"ion", b"ou", b"ism", b"ate", b"iti", b"ous", b"ive", b"ize",
    ];

    for suffix in SUFFIXES {
        let Some(len) = stem_len(w, suffix) else {
            continue;
        };
        // "ion" only counts after s or t; otherwise keep looking
        if *suffix == b"ion" && !(len > 0 && matches!(w[len - 1], b's' | b't')) {
            continue;
        }
        if measure(&w[..len]) > 1 {
            w.truncate(len);
        }
        return;
    }
}

fn step5a(w: &mut Vec<u8>) {
    if let Some(len) = stem_len(w, b"e") {
        let m = measure(&w[..len]);
        if m > 1 || (m == 1 && !ends_cvc(&w[..len])) {
            w.truncate(len);
        }
    }
}

fn step5b(w: &mut Vec<u8>) {
    if measure(w) > 1 && ends_double_consonant(w) && w.ends_with(b"l") {
        w.pop();
    }
}
