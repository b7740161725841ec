//! Clean-up of raw recognizer output.

const HALFWIDTH_KANA_START: u32 = 0xFF61;
const FULLWIDTH_KANA: &str = "。「」、・ヲァィゥェォャュョッーアイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワン゛゜";
const VOICED_MARK: char = '\u{FF9E}';
const SEMI_VOICED_MARK: char = '\u{FF9F}';

/// Normalises recognizer output: drops whitespace, spells ellipses as dots
/// and widens ASCII and half-width katakana.
pub fn post_process(text: &str) -> String {
    let clean = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .replace('\u{2026}', "...");
    halfwidth_to_fullwidth(&collapse_dots(&clean))
}

/// Rewrites every run of two or more `.`/`・` as the same number of `.`.
fn collapse_dots(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for ch in text.chars() {
        if ch == '.' || ch == '\u{30FB}' {
            run.push(ch);
            continue;
        }
        flush_dots(&mut out, &mut run);
        out.push(ch);
    }
    flush_dots(&mut out, &mut run);
    out
}

fn flush_dots(out: &mut String, run: &mut String) {
    match run.chars().count() {
        0 => {}
        1 => out.push_str(run),
        n => out.extend(std::iter::repeat_n('.', n)),
    }
    run.clear();
}

fn halfwidth_to_fullwidth(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        let wide = widen(ch);
        let combined = match chars.peek() {
            Some(&VOICED_MARK) => voiced(wide),
            Some(&SEMI_VOICED_MARK) => semi_voiced(wide),
            _ => None,
        };
        match combined {
            Some(kana) => {
                chars.next();
                out.push(kana);
            }
            None => out.push(wide),
        }
    }
    out
}

fn widen(ch: char) -> char {
    match ch {
        '!'..='~' => char::from_u32(ch as u32 + 0xFEE0).unwrap_or(ch),
        '\u{FF61}'..='\u{FF9F}' => FULLWIDTH_KANA
            .chars()
            .nth((ch as u32 - HALFWIDTH_KANA_START) as usize)
            .unwrap_or(ch),
        _ => ch,
    }
}

fn voiced(kana: char) -> Option<char> {
    match kana {
        'ウ' => Some('ヴ'),
        _ if "カキクケコサシスセソタチツテトハヒフヘホ".contains(kana) => {
            char::from_u32(kana as u32 + 1)
        }
        _ => None,
    }
}

fn semi_voiced(kana: char) -> Option<char> {
    "ハヒフヘホ"
        .contains(kana)
        .then(|| char::from_u32(kana as u32 + 2))
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::post_process;

    #[test]
    fn strips_whitespace_and_widens_ascii() {
        assert_eq!(post_process(" AB c\n12!? "), "ＡＢｃ１２！？");
    }

    #[test]
    fn ellipsis_becomes_dots() {
        assert_eq!(post_process("え…"), "え．．．");
    }

    #[test]
    fn only_runs_of_dots_are_collapsed() {
        assert_eq!(post_process("・・・"), "．．．");
        assert_eq!(post_process("あ・い"), "あ・い");
        assert_eq!(post_process("..・"), "．．．");
        assert_eq!(post_process("a.b"), "ａ．ｂ");
    }

    #[test]
    fn halfwidth_katakana_is_widened() {
        assert_eq!(post_process("ｱｲｳ"), "アイウ");
        assert_eq!(post_process("ｶﾞｷﾞﾊﾟｳﾞ"), "ガギパヴ");
        assert_eq!(post_process("ﾝﾞ"), "ン゛");
        assert_eq!(post_process("｢ｰ｣"), "「ー」");
    }

    #[test]
    fn fullwidth_text_is_untouched() {
        assert_eq!(post_process("こんにちは、世界！"), "こんにちは、世界！");
    }
}
