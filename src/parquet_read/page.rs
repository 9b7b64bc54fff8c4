use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::format::PageHeader;
use crate::page::{PageType, SlicedDataPage, SlicedDictPage, SlicedPage};
use crate::parquet::error::{fmt_err, ParquetResult};
use crate::thrift::TCompactInputProtocol;

/// Iterates the pages of one column chunk held in memory, without copying
/// their bodies.
pub struct SlicePageReader<'a> {
    buffer: &'a [u8],
    offset: usize,
    compression: Compression,
    seen_data_page: bool,
    failed: bool,
}

impl<'a> SlicePageReader<'a> {
    pub fn new(buffer: &'a [u8], compression: Compression) -> Self {
        Self {
            buffer,
            offset: 0,
            compression,
            seen_data_page: false,
            failed: false,
        }
    }

    /// Offset within the chunk of the next page header.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn read_page(&mut self) -> ParquetResult<SlicedPage<'a>> {
        let remaining = &self.buffer[self.offset..];
        let mut prot = TCompactInputProtocol::new(remaining);
        let header = PageHeader::read_from_in_protocol(&mut prot)?;
        let header_size = prot.position();

        let compressed_size = usize::try_from(header.compressed_page_size).map_err(|_| {
            fmt_err!(OutOfSpec, "negative compressed page size {}", header.compressed_page_size)
        })?;
        let uncompressed_size = usize::try_from(header.uncompressed_page_size).map_err(|_| {
            fmt_err!(
                OutOfSpec,
                "negative uncompressed page size {}",
                header.uncompressed_page_size
            )
        })?;
        if compressed_size > remaining.len() - header_size {
            return Err(fmt_err!(
                OutOfSpec,
                "page at chunk offset {} declares {compressed_size} bytes, the chunk has {} left",
                self.offset,
                remaining.len() - header_size
            ));
        }
        let body = &remaining[header_size..header_size + compressed_size];
        self.offset += header_size + compressed_size;

        match PageType::try_from(header.type_)? {
            PageType::DictionaryPage => {
                if self.seen_data_page {
                    return Err(fmt_err!(OutOfSpec, "dictionary page follows a data page"));
                }
                let dict_header = header
                    .dictionary_page_header
                    .ok_or_else(|| fmt_err!(OutOfSpec, "dictionary page without its header"))?;
                let encoding = Encoding::try_from(dict_header.encoding)?;
                if !matches!(encoding, Encoding::Plain | Encoding::PlainDictionary) {
                    return Err(fmt_err!(
                        Unsupported,
                        "dictionary page encoding {encoding} is not supported"
                    ));
                }
                let num_values = usize::try_from(dict_header.num_values).map_err(|_| {
                    fmt_err!(OutOfSpec, "negative dictionary size {}", dict_header.num_values)
                })?;
                Ok(SlicedPage::Dict(SlicedDictPage {
                    buffer: body,
                    compression: self.compression,
                    uncompressed_size,
                    num_values,
                    encoding,
                    is_sorted: dict_header.is_sorted.unwrap_or(false),
                }))
            }
            PageType::DataPage => {
                self.seen_data_page = true;
                let data_header = header
                    .data_page_header
                    .ok_or_else(|| fmt_err!(OutOfSpec, "data page without its header"))?;
                if data_header.num_values < 0 {
                    return Err(fmt_err!(
                        OutOfSpec,
                        "negative data page value count {}",
                        data_header.num_values
                    ));
                }
                Ok(SlicedPage::Data(SlicedDataPage {
                    header: data_header,
                    buffer: body,
                    compression: self.compression,
                    uncompressed_size,
                }))
            }
        }
    }
}

impl<'a> Iterator for SlicePageReader<'a> {
    type Item = ParquetResult<SlicedPage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buffer.len() {
            return None;
        }
        let page = self.read_page();
        self.failed = page.is_err();
        Some(page)
    }
}
