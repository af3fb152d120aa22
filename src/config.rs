/// Remote location of the compressed DBLP dump
pub const DBLP_XML_URL: &str = "https://dblp.org/xml/dblp.xml.gz";

/// Remote location of the DTD the dump is validated against
pub const DBLP_DTD_URL: &str = "https://dblp.org/xml/dblp.dtd";

pub const DBLP_XML_FILENAME: &str = "dblp.xml.gz";
pub const DBLP_DTD_FILENAME: &str = "dblp.dtd";

pub const ORCID_OUTPUT_CSV_FILENAME: &str = "by_orcid.csv";
pub const ALIAS_OUTPUT_CSV_FILENAME: &str = "by_alias.csv";

/// Progress update interval (log every N qualifying elements)
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Only `www` records whose key starts with this prefix describe a person
pub const HOMEPAGE_KEY_PREFIX: &str = "homepages";

/// Element carrying an inline author name
pub const AUTHOR_TAG: &[u8] = b"author";

/// Per-person container element
pub const HOMEPAGE_TAG: &[u8] = b"www";

/// Separator for list-valued CSV cells
pub const LIST_SEPARATOR: &str = "|";

/// Read buffer size for the decompressed XML stream
pub const READ_BUFFER_SIZE: usize = 256 * 1024;
