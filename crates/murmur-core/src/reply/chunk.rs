//! Word-boundary chunking of long text.

/// Split `text` into chunks of at most `budget` characters.
///
/// Words are packed greedily: a word is appended to the current chunk
/// (joined by a single space) while the result stays within the budget,
/// otherwise the chunk is closed and the word starts the next one. A word
/// longer than the budget on its own becomes a chunk by itself; words are
/// never split. Length is measured in Unicode scalar values.
///
/// Runs of whitespace collapse to one space, so joining the chunks with a
/// space reproduces the whitespace-tokenized input.
pub fn split_into_chunks(text: &str, budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
            continue;
        }
        if current_len + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(split_into_chunks("", 250).is_empty());
        assert!(split_into_chunks("   \n\t ", 250).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_into_chunks("hello  there\nfriend", 250), vec!["hello there friend"]);
    }

    #[test]
    fn test_six_hundred_chars_make_three_chunks() {
        // 100 words of 5 chars with one of 6: 599 chars of words + 99 spaces.
        let mut words = vec!["abcde".to_string(); 100];
        words[50] = "abcdef".to_string();
        let text = words.join(" ");
        assert!(text.chars().count() >= 600);

        let chunks = split_into_chunks(&text, 250);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 250);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_chunks_reconstruct_tokens() {
        let text = "the quick  brown fox\tjumps over\n\nthe lazy dog ".repeat(40);
        let chunks = split_into_chunks(&text, 60);
        assert!(chunks.len() > 1);
        assert_eq!(tokens(&chunks.join(" ")), tokens(&text));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 60);
            assert_eq!(chunk.trim(), chunk);
        }
    }

    #[test]
    fn test_oversized_word_is_its_own_chunk() {
        let long = "x".repeat(300);
        let text = format!("before {long} after");
        let chunks = split_into_chunks(&text, 250);
        assert_eq!(chunks, vec!["before".to_string(), long, "after".to_string()]);
    }

    #[test]
    fn test_budget_counts_characters_not_bytes() {
        // Each word is 2 chars but 4 bytes.
        let text = "éé éé éé";
        assert_eq!(split_into_chunks(text, 5), vec!["éé éé", "éé"]);
    }

    #[test]
    fn test_exact_fit_stays_in_one_chunk() {
        assert_eq!(split_into_chunks("abcd efgh", 9), vec!["abcd efgh"]);
        assert_eq!(split_into_chunks("abcd efghi", 9), vec!["abcd", "efghi"]);
    }
}
