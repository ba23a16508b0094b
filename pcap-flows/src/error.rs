use std::io;
use std::path::PathBuf;

use flow_strata::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// pcap-parser errors borrow the reader buffer, so only the rendering is kept
    #[error("{context}: {message}")]
    Pcap {
        context: &'static str,
        message: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot write flow record: {0}")]
    Write(#[from] io::Error),

    #[error("cannot serialize flow record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReaderError {
    pub fn pcap(context: &'static str, err: impl std::fmt::Debug) -> Self {
        ReaderError::Pcap {
            context,
            message: format!("{err:?}"),
        }
    }
}
