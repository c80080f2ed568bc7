use log::warn;

/// One `TAG<TAB>word` line of the lexicon.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexiconEntry {
    pub tag: String,
    pub word: String,
}

impl LexiconEntry {
    pub fn new<T: Into<String>, W: Into<String>>(tag: T, word: W) -> Self {
        LexiconEntry {
            tag: tag.into(),
            word: word.into(),
        }
    }

    pub fn as_pair(&self) -> (&str, &str) {
        (&self.tag, &self.word)
    }
}

/// Reads tab separated lexicon entries. Blank lines are ignored; lines without exactly two
/// fields are skipped with a warning.
pub fn parse_lexicon(text: &str) -> Vec<LexiconEntry> {
    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [tag, word] if !tag.is_empty() && !word.is_empty() => {
                entries.push(LexiconEntry::new(*tag, *word))
            }
            _ => warn!("skipping malformed lexicon line {}: {:?}", index + 1, line),
        }
    }
    entries
}
