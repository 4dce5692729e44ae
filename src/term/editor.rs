// SPDX-License-Identifier: MIT

//! Line editor (C1): a minimal readline-style buffer supporting the emacs-ish
//! control sequences a raw-mode shell client sends before the user hits
//! Enter.

/// Editable input buffer with a cursor, operated on by Unicode scalar values.
#[derive(Debug, Default, Clone)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        Self { buffer: Vec::new(), cursor: 0 }
    }

    pub fn buffer(&self) -> &[char] {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn as_string(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn add_character(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.buffer.remove(self.cursor - 1);
        self.cursor -= 1;
    }

    pub fn delete_character_under_cursor(&mut self) {
        if self.cursor == self.buffer.len() {
            return;
        }
        self.buffer.remove(self.cursor);
    }

    pub fn delete_characters_after_cursor(&mut self) {
        self.buffer.truncate(self.cursor);
    }

    pub fn delete_characters_before_cursor(&mut self) {
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
    }

    pub fn delete_one_word_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }

        let mut has_non_space = false;
        let mut cut_at = None;
        for i in (0..self.cursor).rev() {
            if self.buffer[i] == ' ' {
                if !has_non_space {
                    continue;
                }
                cut_at = Some(i + 1);
                break;
            } else {
                has_non_space = true;
            }
        }

        match cut_at {
            Some(start) => {
                self.buffer.drain(start..self.cursor);
                self.cursor = start;
            }
            None => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
            }
        }
    }

    pub fn go_head(&mut self) {
        self.cursor = 0;
    }

    pub fn go_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    pub fn go_back_one_character(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn go_forward_one_character(&mut self) {
        if self.cursor < self.buffer.len() {
            self.cursor += 1;
        }
    }

    pub fn go_back_one_word(&mut self) {
        if self.cursor == 0 {
            return;
        }

        let mut has_non_delimiter = false;
        for i in (0..self.cursor).rev() {
            if !is_alphanumeric(self.buffer[i]) {
                if !has_non_delimiter {
                    continue;
                }
                self.cursor = i + 1;
                return;
            }
            has_non_delimiter = true;
        }

        self.cursor = 0;
    }

    pub fn go_forward_one_word(&mut self) {
        if self.cursor == self.buffer.len() {
            return;
        }

        let mut has_non_delimiter = false;
        for i in self.cursor..self.buffer.len() {
            if !is_alphanumeric(self.buffer[i]) {
                if !has_non_delimiter {
                    continue;
                }
                self.cursor = i;
                return;
            }
            has_non_delimiter = true;
        }

        self.cursor = self.buffer.len();
    }
}

fn is_alphanumeric(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

const ASCII_SOH: char = 1 as char;
const ASCII_STX: char = 2 as char;
const ASCII_EOT: char = 4 as char;
const ASCII_ENQ: char = 5 as char;
const ASCII_ACK: char = 6 as char;
const ASCII_VT: char = 11 as char;
const ASCII_FF: char = 12 as char;
const ASCII_NAK: char = 21 as char;
const ASCII_ETB: char = 23 as char;
const ASCII_ESC: char = 27 as char;
const ASCII_DEL: char = 127 as char;

/// Replay raw client input through the line editor's control-sequence
/// dispatch table and return the resulting buffer contents, encoded as UTF-8.
///
/// This is the sole entry point callers use: it owns a fresh `LineEditor`
/// for the duration of one input chunk, exactly as the original single-shot
/// `EscapeInput` does.
pub fn escape_input(input: &[u8]) -> Vec<u8> {
    let rs: Vec<char> = String::from_utf8_lossy(input).chars().collect();
    let mut editor = LineEditor::new();

    let mut i = 0usize;
    while i < rs.len() {
        let c = rs[i];
        match c {
            ASCII_SOH => editor.go_head(),
            ASCII_STX => editor.go_back_one_character(),
            ASCII_EOT => editor.delete_character_under_cursor(),
            ASCII_ENQ => editor.go_end(),
            ASCII_ACK => editor.go_forward_one_character(),
            ASCII_VT => editor.delete_characters_after_cursor(),
            ASCII_FF => {} // Ctrl-l, clear the screen: no buffer effect
            ASCII_NAK => editor.delete_characters_before_cursor(),
            ASCII_ETB => editor.delete_one_word_before_cursor(),
            ASCII_ESC if i < rs.len().saturating_sub(2) && rs[i + 1] == '[' && rs[i + 2] == 'C' => {
                editor.go_forward_one_character();
                i += 2;
            }
            ASCII_ESC if i < rs.len().saturating_sub(2) && rs[i + 1] == '[' && rs[i + 2] == 'D' => {
                editor.go_back_one_character();
                i += 2;
            }
            ASCII_ESC if i < rs.len().saturating_sub(1) && rs[i + 1] == 'b' => {
                editor.go_back_one_word();
                i += 1;
            }
            ASCII_ESC if i < rs.len().saturating_sub(1) && rs[i + 1] == 'f' => {
                editor.go_forward_one_word();
                i += 1;
            }
            '\u{8}' | ASCII_DEL => editor.backspace(),
            other => editor.add_character(other),
        }
        i += 1;
    }

    editor.as_string().into_bytes()
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;
