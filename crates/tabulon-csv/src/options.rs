/// Options for reading CSV data.
#[derive(Debug, Clone, Copy)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Options for writing CSV data.
#[derive(Debug, Clone, Copy)]
pub struct CsvWriteOptions {
    pub delimiter: u8,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}
