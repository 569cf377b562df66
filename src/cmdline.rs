//! Windows command lines.
//!
//! `CreateProcessW` takes one UTF-16 string. Each word is quoted the way the
//! MSVC runtime splits it again. Lines handed to `cmd.exe /c` additionally get
//! every cmd metacharacter caret-escaped, quotes included, so cmd never enters
//! a quoted region and never interprets `&`, `|`, `%` and friends.
//!
//! Words are UTF-16 code unit sequences so unpaired surrogates survive.
#![cfg_attr(not(windows), allow(dead_code))]

/// Shell used for fallback lookups
pub const CMD: &str = "cmd.exe";

const SPACE: u16 = b' ' as u16;
const TAB: u16 = b'\t' as u16;
const QUOTE: u16 = b'"' as u16;
const BACKSLASH: u16 = b'\\' as u16;
const CARET: u16 = b'^' as u16;

const CMD_SPECIAL: &[u8] = b"^&|<>()%!\"";

/// Append `word` quoted for the MSVC argument splitter
///
/// `force` quotes even words without whitespace, as is done for the program.
pub fn push_word(line: &mut Vec<u16>, word: &[u16], force: bool) {
    let quote = force
        || word.is_empty()
        || word.iter().any(|&unit| unit == SPACE || unit == TAB);
    if quote {
        line.push(QUOTE);
    }

    let mut backslashes = 0;
    for &unit in word {
        if unit == BACKSLASH {
            backslashes += 1;
        } else {
            if unit == QUOTE {
                // Backslashes before a quote are doubled, plus one for the quote.
                line.extend(std::iter::repeat_n(BACKSLASH, backslashes + 1));
            }
            backslashes = 0;
        }
        line.push(unit);
    }

    if quote {
        line.extend(std::iter::repeat_n(BACKSLASH, backslashes));
        line.push(QUOTE);
    }
}

/// Command line starting `program` directly with `arguments`
pub fn direct<'a>(
    program: &[u16],
    arguments: impl IntoIterator<Item = &'a [u16]>,
) -> Vec<u16> {
    let mut line = Vec::new();
    push_word(&mut line, program, true);
    for argument in arguments {
        line.push(SPACE);
        push_word(&mut line, argument, false);
    }
    line
}

/// Command line running `name` with `arguments` through `cmd.exe /c`
pub fn shell<'a>(
    name: &[u16],
    arguments: impl IntoIterator<Item = &'a [u16]>,
) -> Vec<u16> {
    let mut line: Vec<u16> = CMD.encode_utf16().collect();
    line.extend(" /c ".encode_utf16());

    let mut words = Vec::new();
    push_word(&mut words, name, false);
    for argument in arguments {
        words.push(SPACE);
        push_word(&mut words, argument, false);
    }

    for unit in words {
        if CMD_SPECIAL.iter().any(|&special| u16::from(special) == unit) {
            line.push(CARET);
        }
        line.push(unit);
    }
    line
}
