//! Data pipeline: message encoding, corpus loading, batching.
//!
//! Corpus files hold one message per paragraph; messages are separated by a
//! blank line. A message is encoded as a one-hot matrix over its leading bytes,
//! flattened to `input_bytes * 256` floats.
//!
//! * **[`encode_message`]** — one message → one-hot row.
//! * **[`messages_to_tensor`]** / **[`labels_to_tensor`]** — raw batch → Candle tensors.
//! * **[`Corpus`]** — labelled messages interleaved from an author and other writers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use candle_core::{Device, Result, Tensor};

/// Number of distinct byte values; width of one position in the one-hot input.
pub const BYTE_VALUES: usize = 256;

const MESSAGE_SEPARATOR: &str = "\n\n";

// ── Encoding ────────────────────────────────────────────────────────────────

/// One-hot encode the first `input_bytes` bytes of `message`.
///
/// Byte `b` at position `i` sets slot `i * 256 + b`. Positions past the end of
/// a short message stay all-zero; bytes past `input_bytes` are ignored.
pub fn encode_message(message: &str, input_bytes: usize) -> Vec<f32> {
    let mut row = vec![0.0f32; input_bytes * BYTE_VALUES];
    for (i, b) in message.bytes().take(input_bytes).enumerate() {
        row[i * BYTE_VALUES + b as usize] = 1.0;
    }
    row
}

/// Encode a batch of messages into a `(batch, input_bytes * 256)` tensor.
pub fn messages_to_tensor<S: AsRef<str>>(
    messages: &[S],
    input_bytes: usize,
    device: &Device,
) -> Result<Tensor> {
    let width = input_bytes * BYTE_VALUES;
    let mut data = Vec::with_capacity(messages.len() * width);
    for message in messages {
        data.extend(encode_message(message.as_ref(), input_bytes));
    }
    Tensor::from_vec(data, (messages.len(), width), device)
}

/// Encode authorship labels into a `(batch, 1)` tensor of 0.0 / 1.0.
pub fn labels_to_tensor(labels: &[bool], device: &Device) -> Result<Tensor> {
    let data: Vec<f32> = labels
        .iter()
        .map(|&by_author| if by_author { 1.0 } else { 0.0 })
        .collect();
    Tensor::from_vec(data, (labels.len(), 1), device)
}

// ── Corpus ──────────────────────────────────────────────────────────────────

/// Split corpus text into messages. Blank-only chunks are skipped.
pub fn split_messages(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split(MESSAGE_SEPARATOR)
        .filter(|message| !message.trim().is_empty())
}

/// A message and whether the target author wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledMessage {
    pub text: String,
    pub by_author: bool,
}

impl LabeledMessage {
    pub fn new(text: impl Into<String>, by_author: bool) -> Self {
        Self {
            text: text.into(),
            by_author,
        }
    }
}

/// Labelled messages in interleaved order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    messages: Vec<LabeledMessage>,
}

impl Corpus {
    /// Interleave author messages with messages from other writers.
    ///
    /// Sources are visited round-robin in the order `others[0]`, author,
    /// `others[1]`, …, and the corpus ends as soon as any source runs dry. This
    /// keeps author and non-author messages roughly balanced.
    pub fn interleave(author: Vec<String>, others: Vec<Vec<String>>) -> anyhow::Result<Self> {
        if others.is_empty() {
            anyhow::bail!("at least one source of non-author messages is required");
        }

        let mut author = author.into_iter();
        let mut others: Vec<_> = others.into_iter().map(Vec::into_iter).collect();
        let mut messages = Vec::new();

        'rounds: loop {
            for (idx, source) in others.iter_mut().enumerate() {
                let Some(text) = source.next() else {
                    break 'rounds;
                };
                messages.push(LabeledMessage::new(text, false));

                if idx == 0 {
                    let Some(text) = author.next() else {
                        break 'rounds;
                    };
                    messages.push(LabeledMessage::new(text, true));
                }
            }
        }

        Ok(Self { messages })
    }

    /// Read corpus files and interleave them. Each source is a chain of files
    /// read back to back.
    pub fn from_files(author: &[PathBuf], others: &[Vec<PathBuf>]) -> anyhow::Result<Self> {
        let author_messages = read_chain(author)?;
        let other_messages = others
            .iter()
            .map(|chain| read_chain(chain))
            .collect::<anyhow::Result<Vec<_>>>()?;

        tracing::info!(
            author = author_messages.len(),
            sources = other_messages.len(),
            others = other_messages.iter().map(Vec::len).sum::<usize>(),
            "Read corpus files"
        );

        Self::interleave(author_messages, other_messages)
    }

    /// Split off a validation set: the first `len / divisor` messages validate,
    /// the rest train. Returns `(training, validation)`.
    pub fn split_validation(
        self,
        divisor: usize,
    ) -> anyhow::Result<(Vec<LabeledMessage>, Vec<LabeledMessage>)> {
        if divisor == 0 {
            anyhow::bail!("validation divisor must be non-zero");
        }
        let mut validation = self.messages;
        let training = validation.split_off(validation.len() / divisor);
        Ok((training, validation))
    }

    pub fn messages(&self) -> &[LabeledMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages labelled as written by the author.
    pub fn author_count(&self) -> usize {
        self.messages.iter().filter(|m| m.by_author).count()
    }
}

fn read_chain(paths: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    let mut messages = Vec::new();
    for path in paths {
        messages.extend(read_messages(path)?);
    }
    Ok(messages)
}

fn read_messages(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read corpus file {}", path.display()))?;
    Ok(split_messages(&text).map(str::to_owned).collect())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn encode_sets_one_slot_per_byte() {
        let row = encode_message("ab", 4);
        assert_eq!(row.len(), 4 * 256);
        assert_eq!(row[b'a' as usize], 1.0);
        assert_eq!(row[256 + b'b' as usize], 1.0);
        assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 2);
    }

    #[test]
    fn encode_truncates_long_messages() {
        let long = "x".repeat(100);
        let row = encode_message(&long, 32);
        assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 32);
    }

    #[test]
    fn encode_uses_raw_utf8_bytes() {
        // 'é' is two bytes in UTF-8: 0xC3 0xA9
        let row = encode_message("é", 2);
        assert_eq!(row[0xC3], 1.0);
        assert_eq!(row[256 + 0xA9], 1.0);
    }

    #[test]
    fn batch_tensor_shapes() {
        let device = Device::Cpu;
        let input = messages_to_tensor(&["hi", "there", ""], 8, &device).unwrap();
        assert_eq!(input.dims(), &[3, 8 * 256]);

        let labels = labels_to_tensor(&[true, false, true], &device).unwrap();
        assert_eq!(labels.dims(), &[3, 1]);
        let values: Vec<f32> = labels.flatten_all().unwrap().to_vec1().unwrap();
        assert_eq!(values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn split_skips_blank_chunks() {
        let text = "first\nstill first\n\nsecond\n\n\n\nthird\n";
        let messages: Vec<_> = split_messages(text).collect();
        assert_eq!(messages, vec!["first\nstill first", "second", "third\n"]);
    }

    #[test]
    fn interleave_order_and_labels() {
        let corpus = Corpus::interleave(
            strings(&["r1", "r2"]),
            vec![strings(&["b1", "b2"]), strings(&["d1", "d2"])],
        )
        .unwrap();
        let order: Vec<_> = corpus
            .messages()
            .iter()
            .map(|m| (m.text.as_str(), m.by_author))
            .collect();
        assert_eq!(
            order,
            vec![
                ("b1", false),
                ("r1", true),
                ("d1", false),
                ("b2", false),
                ("r2", true),
                ("d2", false),
            ]
        );
        assert_eq!(corpus.author_count(), 2);
    }

    #[test]
    fn interleave_stops_when_any_source_is_exhausted() {
        let corpus = Corpus::interleave(
            strings(&["r1"]),
            vec![strings(&["b1", "b2", "b3"]), strings(&["d1", "d2"])],
        )
        .unwrap();
        // b1 r1 d1 b2, then the author source runs dry.
        assert_eq!(corpus.len(), 4);
    }

    #[test]
    fn interleave_requires_other_writers() {
        assert!(Corpus::interleave(strings(&["r1"]), Vec::new()).is_err());
    }

    #[test]
    fn validation_takes_leading_fifth() {
        let corpus = Corpus::interleave(
            strings(&["r1", "r2", "r3", "r4", "r5"]),
            vec![strings(&["o1", "o2", "o3", "o4", "o5"])],
        )
        .unwrap();
        let (training, validation) = corpus.split_validation(5).unwrap();
        assert_eq!(validation.len(), 2);
        assert_eq!(training.len(), 8);
        assert_eq!(validation[0].text, "o1");
        assert_eq!(validation[1].text, "r1");
    }

    #[test]
    fn from_files_chains_sources() {
        let dir = tempfile::tempdir().unwrap();
        let raven = dir.path().join("raven.txt");
        let berk = dir.path().join("berk.txt");
        let sidju = dir.path().join("sidju.txt");
        std::fs::write(&raven, "caw\n\nnevermore\n\nquoth").unwrap();
        std::fs::write(&berk, "hello").unwrap();
        std::fs::write(&sidju, "hey\n\nhi").unwrap();

        let corpus = Corpus::from_files(&[raven], &[vec![berk, sidju]]).unwrap();
        let texts: Vec<_> = corpus.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["hello", "caw", "hey", "nevermore", "hi", "quoth"]
        );
    }

    #[test]
    fn from_files_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = Corpus::from_files(&[missing.clone()], &[vec![missing]]).unwrap_err();
        assert!(format!("{err:#}").contains("missing.txt"));
    }
}
