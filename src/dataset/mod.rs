

pub mod csv_io;
pub mod partition;

pub use csv_io::{
    extract_labels, read_raw_rows, read_rows, write_feature_table, write_predictions, RawRow,
};
pub use partition::{Dataset, DatasetPartitioner, Partition, SplitBoundary};
