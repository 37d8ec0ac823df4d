use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid event-name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: cannot parse {field} from '{value}'")]
    Parse {
        line: u64,
        field: &'static str,
        value: String,
    },
}
