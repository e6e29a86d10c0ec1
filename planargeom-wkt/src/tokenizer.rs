//! A hand-written tokenizer for WKT text (§4.8), in the same spirit as the
//! source's original character-at-a-time tokenizer but rebuilt against an
//! `Iterator<Item = Token>` instead of hand-rolled string splicing.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Word(String),
    Number(f64),
    Comma,
    ParenOpen,
    ParenClose,
    Semicolon,
    Equals,
}

/// A token paired with the 1-based column it started at, for `{errcode,
/// column, message}` error reporting (§4.8).
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub column: usize,
}

pub struct Tokenizer<'a> {
    chars: std::str::CharIndices<'a>,
    text: &'a str,
    peeked: Option<(usize, char)>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Tokenizer {
            chars: text.char_indices(),
            text,
            peeked: None,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.peeked.take().or_else(|| self.chars.next())
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn read_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> (&'a str, usize) {
        let mut end = start;
        loop {
            match self.peek() {
                Some((idx, c)) if pred(c) => {
                    end = idx + c.len_utf8();
                    self.bump();
                }
                _ => break,
            }
        }
        (&self.text[start..end], end)
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+' || c == '-'
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Spanned, (usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, c) = self.bump()?;
            let column = idx + 1;
            if c.is_whitespace() {
                continue;
            }
            return Some(match c {
                '(' => Ok(Spanned { token: Token::ParenOpen, column }),
                ')' => Ok(Spanned { token: Token::ParenClose, column }),
                ',' => Ok(Spanned { token: Token::Comma, column }),
                ';' => Ok(Spanned { token: Token::Semicolon, column }),
                '=' => Ok(Spanned { token: Token::Equals, column }),
                c if c.is_ascii_digit() || c == '-' || c == '+' => {
                    let (text, _end) = self.read_while(idx, is_number_char);
                    match text.parse::<f64>() {
                        Ok(n) => Ok(Spanned { token: Token::Number(n), column }),
                        Err(_) => Err((column, format!("invalid number literal '{text}'"))),
                    }
                }
                c if is_word_start(c) => {
                    let (text, _end) = self.read_while(idx, is_word_char);
                    Ok(Spanned { token: Token::Word(text.to_ascii_uppercase()), column })
                }
                other => Err((column, format!("unexpected character '{other}'"))),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Tokenizer::new(input)
            .map(|r| r.expect("no lexing errors expected").token)
            .collect()
    }

    #[test]
    fn tokenizes_point() {
        assert_eq!(
            tokens("POINT (1 2)"),
            vec![
                Token::Word("POINT".to_string()),
                Token::ParenOpen,
                Token::Number(1.0),
                Token::Number(2.0),
                Token::ParenClose,
            ]
        );
    }

    #[test]
    fn tokenizes_negative_and_scientific_numbers() {
        assert_eq!(
            tokens("-1.5e-3 2E+4"),
            vec![Token::Number(-1.5e-3), Token::Number(2e4)]
        );
    }

    #[test]
    fn tokenizes_srid_prefix() {
        assert_eq!(
            tokens("SRID=4326;POINT(0 0)"),
            vec![
                Token::Word("SRID".to_string()),
                Token::Equals,
                Token::Number(4326.0),
                Token::Semicolon,
                Token::Word("POINT".to_string()),
                Token::ParenOpen,
                Token::Number(0.0),
                Token::Number(0.0),
                Token::ParenClose,
            ]
        );
    }

    #[test]
    fn words_are_case_folded_to_uppercase() {
        assert_eq!(tokens("point z empty"), vec![
            Token::Word("POINT".to_string()),
            Token::Word("Z".to_string()),
            Token::Word("EMPTY".to_string()),
        ]);
    }

    #[test]
    fn rejects_unknown_character() {
        let err = Tokenizer::new("POINT(#)").find_map(|r| r.err());
        assert!(err.is_some());
    }
}
