//! Concrete end-to-end scenarios: streaming merge equivalence, vocabulary
//! identity enforcement, placeholder levels, and the worked alignment
//! examples.

use std::sync::Arc;

use strata::{
    build_vocabulary, chunk_documents, process_chunk, process_corpus, process_stream, ChunkText,
    Error, Level, MergeAccumulator, PipelineConfig, Tokenizer,
};

const DOCS: [&str; 3] = [
    "The cat sat on the mat.",
    "Dogs bark. Cats purr quietly.",
    "A third short document here.",
];

fn chunk_count(docs: &[&str], chunk_bytes: usize) -> usize {
    chunk_documents(docs, chunk_bytes).len()
}

#[test]
fn merge_equivalence_two_and_five_chunk_splits() {
    let config = PipelineConfig::default();
    let one_shot = process_corpus(&DOCS, &config).unwrap();
    let vocab = build_vocabulary(&DOCS, &config);

    // Chunk sizes chosen so the corpus splits into more chunks than
    // documents one way and far more the other way.
    for chunk_bytes in [40, 12] {
        let chunks = chunk_documents(&DOCS, chunk_bytes);
        assert!(chunks.len() >= 3, "split produced too few chunks");
        let streamed = process_stream(chunks, &vocab, &config).unwrap();

        assert_eq!(
            streamed.token_ids(Level::Word).unwrap(),
            one_shot.token_ids(Level::Word).unwrap(),
            "token ids diverged at chunk size {chunk_bytes}"
        );
        assert_eq!(
            streamed
                .corpus(Level::Word)
                .unwrap()
                .offsets(Level::Document)
                .unwrap(),
            one_shot
                .corpus(Level::Word)
                .unwrap()
                .offsets(Level::Document)
                .unwrap(),
            "document offsets diverged at chunk size {chunk_bytes}"
        );
    }

    assert!(chunk_count(&DOCS, 12) > chunk_count(&DOCS, 40));
}

#[test]
fn single_chunk_stream_equals_one_shot() {
    let config = PipelineConfig::default().with_levels(&[Level::Byte, Level::Word]);
    let docs = ["just one document"];
    let one_shot = process_corpus(&docs, &config).unwrap();

    let vocab = build_vocabulary(&docs, &config);
    let chunks = vec![ChunkText {
        text: docs[0].to_string(),
        ends_document: true,
    }];
    let streamed = process_stream(chunks, &vocab, &config).unwrap();

    for level in [Level::Byte, Level::Word] {
        assert_eq!(
            streamed.token_ids(level).unwrap(),
            one_shot.token_ids(level).unwrap()
        );
        let s = streamed.corpus(level).unwrap();
        let o = one_shot.corpus(level).unwrap();
        for field in Level::ALL {
            assert_eq!(s.offsets(field), o.offsets(field), "field {field} diverged");
        }
    }
    assert_eq!(
        streamed.alignment(Level::Byte, Level::Word).unwrap(),
        one_shot.alignment(Level::Byte, Level::Word).unwrap()
    );
}

#[test]
fn content_equal_vocabularies_are_rejected() {
    let config = PipelineConfig::default();
    // Two builds over identical input: equal content, distinct instances.
    let vocab_a = build_vocabulary(&DOCS, &config);
    let vocab_b = build_vocabulary(&DOCS, &config);

    let chunk = ChunkText {
        text: DOCS[0].to_string(),
        ends_document: true,
    };
    let built_a = process_chunk(&chunk, true, &config, &vocab_a).unwrap();
    let built_b = process_chunk(&chunk, true, &config, &vocab_b).unwrap();

    let mut acc = MergeAccumulator::new(vocab_a, config);
    acc.fold(built_a).unwrap();
    let err = acc.fold(built_b).unwrap_err();
    assert!(matches!(err, Error::VocabularyMismatch { chunk: 1 }));
}

#[test]
fn config_mismatch_is_fatal() {
    let config = PipelineConfig::default();
    let other = PipelineConfig::default().with_chunk_bytes(7);
    let vocab = build_vocabulary(&DOCS, &config);

    let chunk = ChunkText {
        text: DOCS[0].to_string(),
        ends_document: true,
    };
    let bundle = process_chunk(&chunk, true, &config, &vocab).unwrap();

    let mut acc = MergeAccumulator::new(vocab, other);
    assert!(matches!(
        acc.fold(bundle),
        Err(Error::ConfigMismatch { chunk: 0 })
    ));
}

#[test]
fn placeholder_byte_level_is_marked() {
    // Pipeline tokenizes characters only; a byte level is synthesized so
    // alignments can still exist, and must be distinguishable from a
    // genuine one.
    let config = PipelineConfig::default().with_levels(&[Level::Character, Level::Word]);
    let mut bundle = process_corpus(&["abc def"], &config).unwrap();
    assert!(!bundle.has_level(Level::Byte));

    bundle.ensure_unit_levels().unwrap();
    assert!(bundle.has_level(Level::Byte));
    assert!(bundle.is_placeholder(Level::Byte));
    assert!(!bundle.is_placeholder(Level::Character));

    // The placeholder carries no token identity: ids are all 1.
    assert!(bundle
        .token_ids(Level::Byte)
        .unwrap()
        .iter()
        .all(|&id| id == 1));

    // Alignments over the placeholder can now be built.
    bundle.build_canonical_alignments().unwrap();
    let map = bundle.alignment(Level::Byte, Level::Word).unwrap();
    assert_eq!(
        map.alignment().len(),
        bundle.corpus(Level::Byte).unwrap().n_tokens()
    );
}

#[test]
fn worked_alignment_examples() {
    // tokens ["a","b","c"]: each byte its own word -> [1, 2, 3]
    let bundle = process_corpus(
        &["a b c"],
        &PipelineConfig::default().with_levels(&[Level::Byte, Level::Word]),
    )
    .unwrap();
    let map = bundle.alignment(Level::Byte, Level::Word).unwrap();
    // Bytes: a, ' ', b, ' ', c — separators belong to the preceding word.
    assert_eq!(map.alignment(), &[1, 1, 2, 2, 3]);

    // tokens ["ab","c"]: two bytes in word 1, one in word 2.
    let bundle = process_corpus(
        &["ab c"],
        &PipelineConfig::default().with_levels(&[Level::Byte, Level::Word]),
    )
    .unwrap();
    let map = bundle.alignment(Level::Byte, Level::Word).unwrap();
    assert_eq!(map.alignment(), &[1, 1, 1, 2]);
}

#[test]
fn custom_tokenizer_streams_identically() {
    struct Stemmer;
    impl Tokenizer for Stemmer {
        fn tokenize(&self, text: &str) -> Vec<String> {
            use unicode_segmentation::UnicodeSegmentation;
            text.unicode_words()
                .map(|w| w.trim_end_matches('s').to_lowercase())
                .collect()
        }
    }

    let tokenizer: Arc<dyn Tokenizer> = Arc::new(Stemmer);
    let config = PipelineConfig::default().with_word_tokenizer(tokenizer);
    let docs = ["Cats chase dogs.", "Dogs chase cats."];

    let one_shot = process_corpus(&docs, &config).unwrap();
    let vocab = build_vocabulary(&docs, &config);
    let streamed = process_stream(chunk_documents(&docs, 10), &vocab, &config).unwrap();

    assert_eq!(
        streamed.token_ids(Level::Word).unwrap(),
        one_shot.token_ids(Level::Word).unwrap()
    );
    // "cats"/"Cats" and "dogs"/"Dogs" collapse to shared ids.
    let ids = one_shot.token_ids(Level::Word).unwrap();
    assert_eq!(ids[0], ids[5]);
    assert_eq!(ids[2], ids[3]);
}

#[test]
fn empty_document_preserved_across_paths() {
    let docs = ["first doc", "", "third doc"];
    let config = PipelineConfig::default();
    let one_shot = process_corpus(&docs, &config).unwrap();

    let doc_offsets = one_shot
        .corpus(Level::Word)
        .unwrap()
        .offsets(Level::Document)
        .unwrap();
    // Three documents, the middle one empty (duplicate start).
    assert_eq!(doc_offsets.unit_count(), 3);
    assert_eq!(doc_offsets.as_slice(), &[1, 3, 3, 5]);

    let vocab = build_vocabulary(&docs, &config);
    let streamed = process_stream(chunk_documents(&docs, 6), &vocab, &config).unwrap();
    assert_eq!(
        streamed
            .corpus(Level::Word)
            .unwrap()
            .offsets(Level::Document)
            .unwrap(),
        doc_offsets
    );
}
