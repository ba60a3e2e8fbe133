/*!
 * Tests for bounded-size chunking
 */

use newsdigest::translation::TextChunker;

/// Test that a short text yields itself as the only chunk
#[test]
fn test_chunks_with_short_text_should_yield_whole_text() {
    let chunker = TextChunker::new("Petróleo sobe", 4000);
    assert_eq!(chunker.chunks().collect::<Vec<_>>(), vec!["Petróleo sobe"]);
}

/// Test that chunks concatenate back to the input
#[test]
fn test_chunks_with_long_text_should_cover_input_in_order() {
    let text = "Ações da Petrobras sobem após anúncio de dividendos extraordinários.";
    let chunker = TextChunker::new(text, 10);
    let chunks: Vec<&str> = chunker.chunks().collect();

    assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    assert_eq!(chunks.concat(), text);
    assert_eq!(chunker.count(), chunks.len());
}

/// Test that multi-byte characters are never split
#[test]
fn test_chunks_with_accents_should_count_characters_not_bytes() {
    let chunker = TextChunker::new("ãéíõú", 2);
    assert_eq!(chunker.chunks().collect::<Vec<_>>(), vec!["ãé", "íõ", "ú"]);
}

/// Test that whitespace-only chunks are skipped
#[test]
fn test_chunks_with_blank_region_should_skip_it() {
    let chunker = TextChunker::new("ab      cd", 3);
    assert_eq!(chunker.chunks().collect::<Vec<_>>(), vec!["ab ", "  c", "d"]);
}

/// Test that an empty text yields nothing
#[test]
fn test_chunks_with_empty_text_should_yield_nothing() {
    assert_eq!(TextChunker::new("", 5).count(), 0);
    assert_eq!(TextChunker::new("   ", 5).count(), 0);
}

/// Test that a chunker can be iterated more than once
#[test]
fn test_chunks_should_be_restartable() {
    let chunker = TextChunker::new("abcdefg", 3);
    let first: Vec<&str> = (&chunker).into_iter().collect();
    let second: Vec<&str> = chunker.chunks().collect();
    assert_eq!(first, second);
}
