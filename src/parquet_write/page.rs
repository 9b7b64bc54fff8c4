use std::io::Write;

use crate::compression::{compress, CompressionOptions};
use crate::encoding::Encoding;
use crate::format::{DataPageHeader, DictionaryPageHeader, PageHeader};
use crate::page::{CompressedPage, Page, PageType};
use crate::parquet::error::ParquetResult;
use crate::parquet_write::util::to_i32;
use crate::thrift::TCompactOutputProtocol;

/// Where and how a page landed in the file.
#[derive(Debug, Clone)]
pub struct PageWriteSpec {
    pub header: PageHeader,
    pub header_size: u64,
    pub offset: u64,
    pub bytes_written: u64,
}

impl PageWriteSpec {
    pub fn page_type(&self) -> ParquetResult<PageType> {
        PageType::try_from(self.header.type_)
    }
}

/// Compresses the body of `page` with the file codec.
pub fn compress_page(page: Page, options: CompressionOptions) -> ParquetResult<CompressedPage> {
    let (page_type, num_values, encoding, body) = match page {
        Page::Dict(dict) => (PageType::DictionaryPage, dict.num_values, Encoding::Plain, dict.buffer),
        Page::Data(data) => (PageType::DataPage, data.num_values, data.encoding, data.buffer),
    };
    let mut buffer = Vec::new();
    compress(options, &body, &mut buffer)?;
    Ok(CompressedPage {
        page_type,
        num_values,
        encoding,
        uncompressed_page_size: body.len(),
        compression: options.into(),
        buffer,
    })
}

fn assemble_page_header(page: &CompressedPage) -> ParquetResult<PageHeader> {
    let num_values = to_i32(page.num_values, "page value count")?;
    let mut header = PageHeader {
        type_: page.page_type.into(),
        uncompressed_page_size: to_i32(page.uncompressed_page_size, "uncompressed page size")?,
        compressed_page_size: to_i32(page.compressed_size(), "compressed page size")?,
        crc: None,
        data_page_header: None,
        dictionary_page_header: None,
    };
    match page.page_type {
        PageType::DataPage => {
            header.data_page_header = Some(DataPageHeader {
                num_values,
                encoding: page.encoding.into(),
                definition_level_encoding: Encoding::Rle.into(),
                repetition_level_encoding: Encoding::Rle.into(),
            });
        }
        PageType::DictionaryPage => {
            header.dictionary_page_header = Some(DictionaryPageHeader {
                num_values,
                encoding: page.encoding.into(),
                is_sorted: None,
            });
        }
    }
    Ok(header)
}

/// Writes the framed header and compressed body of `page` at `offset`.
pub fn write_page<W: Write>(
    writer: &mut W,
    offset: u64,
    page: &CompressedPage,
) -> ParquetResult<PageWriteSpec> {
    let header = assemble_page_header(page)?;
    let mut header_bytes = Vec::new();
    header.write_to_out_protocol(&mut TCompactOutputProtocol::new(&mut header_bytes))?;
    writer.write_all(&header_bytes)?;
    writer.write_all(&page.buffer)?;

    let header_size = header_bytes.len() as u64;
    Ok(PageWriteSpec {
        header,
        header_size,
        offset,
        bytes_written: header_size + page.buffer.len() as u64,
    })
}
