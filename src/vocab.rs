#[cfg(feature = "bincode")]
use bincode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::{BowErr, Result, WordId, WordWeight};

/// Upper bound on header-derived pre-allocation. A full (k=20, l=10)
/// tree would claim terabytes from a 30-byte header otherwise.
const MAX_PREALLOC: usize = 1 << 20;

/// One node of the vocabulary tree.
///
/// A node is a leaf iff it carries a [`word_id`](Node::word_id); the
/// leaves are exactly the words of the vocabulary, numbered in the order
/// they appear in the file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    /// Index of this node in the vocabulary's node table.
    pub id: usize,
    /// Parent node id. `None` only for the root.
    pub parent: Option<usize>,
    /// Child node ids, in file order. Empty for leaves.
    pub children: Vec<usize>,
    /// Cluster-center descriptor bytes. Empty for the implicit root.
    pub descriptor: Vec<u8>,
    /// IDF weight. Meaningful for scoring only on leaves; internal nodes
    /// keep the value the file carries for them.
    pub weight: WordWeight,
    /// Word id, present only on leaves.
    pub word_id: Option<WordId>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.word_id.is_some()
    }
}

/// Visual vocabulary: a hierarchical tree of cluster-center nodes whose
/// leaves are the "words" frames are quantized into. Loaded once from a
/// DBoW2-compatible text file, then immutable; share it behind `&` or an
/// `Arc` across as many readers as needed.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct Vocabulary {
    k: usize,
    l: usize,
    /// Tree nodes, indexed by id. Node 0 is the implicit root.
    nodes: Vec<Node>,
    /// Node id of each word, indexed by word id.
    words: Vec<usize>,
}

/// Vocabulary API
impl Vocabulary {
    /// Read a vocabulary file that is compatible with DBoW2 (only the
    /// L1-norm / TF-IDF subset is supported).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a DBoW2-format vocabulary from any buffered reader.
    ///
    /// Example contents:
    ///
    /// ```text
    /// 10 6 0 0
    /// 0 0 252 188 188 242 169 109 85 143 187 191 164 25 222 255 72 27 129 215 237 16 58 111 219 51 219 211 85 127 192 112 134 34  0
    /// 0 0 93 125 221 103 180 14 111 184 112 234 255 76 215 115 153 115 22 196 124 110 233 240 249 46 237 239 101 20 104 243 66 33  0
    /// ```
    ///
    /// The first line holds `k l scoring_type weighting_type`. Each
    /// remaining line is one non-root node: parent id, leaf flag, the
    /// descriptor bytes, and a trailing weight. The root is implicit as
    /// node 0 and never appears in the file.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(BowErr::EmptyVocabulary),
        };
        let (k, l) = parse_header(&header)?;

        let mut nodes: Vec<Node> = Vec::with_capacity(expected_nodes(k, l).min(MAX_PREALLOC));
        let mut words: Vec<usize> = Vec::with_capacity(expected_words(k, l).min(MAX_PREALLOC));

        // The root is not read from the file.
        nodes.push(Node {
            id: 0,
            parent: None,
            children: Vec::new(),
            descriptor: Vec::new(),
            weight: 0.,
            word_id: None,
        });

        for line in lines {
            let line = line?;
            // node ids follow file order; the header occupies line 1
            let lineno = nodes.len() + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(BowErr::NodeFieldCount {
                    line: lineno,
                    found: fields.len(),
                });
            }

            let id = nodes.len();
            let parent: usize = fields[0].parse().map_err(|_| BowErr::NodeFieldParse {
                line: lineno,
                name: "parent id",
                value: fields[0].to_string(),
            })?;
            if parent >= nodes.len() {
                return Err(BowErr::UnknownParent {
                    line: lineno,
                    parent,
                });
            }
            let leaf_flag: i64 = fields[1].parse().map_err(|_| BowErr::NodeFieldParse {
                line: lineno,
                name: "leaf flag",
                value: fields[1].to_string(),
            })?;

            // Everything between the leaf flag and the trailing weight is
            // a descriptor component. The width is taken per line: ORB
            // vocabularies carry 32 bytes regardless of the tree depth.
            let mut descriptor = Vec::with_capacity(fields.len() - 3);
            for field in &fields[2..fields.len() - 1] {
                let byte: u8 = field.parse().map_err(|_| BowErr::NodeFieldParse {
                    line: lineno,
                    name: "descriptor byte",
                    value: field.to_string(),
                })?;
                descriptor.push(byte);
            }

            let weight_field = fields[fields.len() - 1];
            let weight: WordWeight = weight_field.parse().map_err(|_| BowErr::NodeFieldParse {
                line: lineno,
                name: "weight",
                value: weight_field.to_string(),
            })?;

            nodes[parent].children.push(id);
            let word_id = if leaf_flag != 0 {
                let word_id = words.len() as WordId;
                words.push(id);
                Some(word_id)
            } else {
                None
            };
            nodes.push(Node {
                id,
                parent: Some(parent),
                children: Vec::new(),
                descriptor,
                weight,
                word_id,
            });
        }

        debug!(
            k,
            l,
            nodes = nodes.len(),
            words = words.len(),
            "loaded vocabulary"
        );

        Ok(Self { k, l, nodes, words })
    }

    /// Load a previously [`save`](Vocabulary::save)d vocabulary.
    #[cfg(feature = "bincode")]
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let mut file = File::open(file)?;
        let mut buffer: Vec<u8> = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut buffer)?;
        Ok(bincode::deserialize(&buffer)?)
    }

    /// Save the vocabulary to a file, so a text vocabulary parsed once
    /// can be reloaded without going through the parser again.
    #[cfg(feature = "bincode")]
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let serialized = bincode::serialize(&self)?;
        let mut file = File::create(file)?;
        std::io::Write::write_all(&mut file, &serialized)?;
        Ok(())
    }

    /// Branching factor (`k`) declared by the file header.
    pub fn branching_factor(&self) -> usize {
        self.k
    }

    /// Depth levels (`l`) declared by the file header.
    pub fn depth_levels(&self) -> usize {
        self.l
    }

    /// Total number of tree nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of words (leaves).
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The leaf node carrying `word_id`.
    pub fn word(&self, word_id: WordId) -> Option<&Node> {
        let &node_id = self.words.get(word_id as usize)?;
        self.nodes.get(node_id)
    }
}

/// Parse and validate the 4-field metadata header.
fn parse_header(line: &str) -> Result<(usize, usize)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(BowErr::HeaderFieldCount(fields.len()));
    }
    // Scoring enums from DBoW2: L1_NORM=0, L2_NORM=1, CHI_SQUARE=2,
    // KL=3, BHATTACHARYYA=4, DOT_PRODUCT=5 - we only implement L1_NORM.
    // Weighting enums: TF_IDF=0, TF=1, IDF=2, BINARY=3 - only TF_IDF.
    let ranges: [(&'static str, i64, i64); 4] = [
        ("branching factor", 0, 20),
        ("depth levels", 1, 10),
        ("scoring type", 0, 0),
        ("weighting type", 0, 0),
    ];
    let mut parsed = [0i64; 4];
    for (i, &(name, min, max)) in ranges.iter().enumerate() {
        let value: i64 = fields[i].parse().map_err(|_| BowErr::HeaderFieldParse {
            name,
            value: fields[i].to_string(),
        })?;
        if value < min || value > max {
            return Err(BowErr::UnsupportedMetadata {
                name,
                value,
                min,
                max,
            });
        }
        parsed[i] = value;
    }
    Ok((parsed[0] as usize, parsed[1] as usize))
}

// Geometric-series size of a full (k, l) tree. Pre-sizing only; the
// file's actual node count is authoritative.
fn expected_nodes(k: usize, l: usize) -> usize {
    if k < 2 {
        return l + 1;
    }
    let k = k as f64;
    ((k.powi(l as i32 + 1) - 1.) / (k - 1.)) as usize
}

fn expected_words(k: usize, l: usize) -> usize {
    if k < 2 {
        return 1;
    }
    ((k as f64).powi(l as i32 + 1) - 1.) as usize
}

impl fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vocabulary")
            .field("Word/Leaf Nodes", &self.words.len())
            .field("Other Nodes", &(self.nodes.len() - self.words.len()))
            .field("Levels", &self.l)
            .field("Branching Factor", &self.k)
            .finish()
    }
}
