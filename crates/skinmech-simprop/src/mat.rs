//! MATLAB MAT-file input
//!
//! Level 5 files (what `save` writes by default, compressed or not) are read
//! through the `matfile` crate. Level 4 files are parsed here: a flat
//! sequence of variables, each starting with five 32-bit integers (`type`,
//! `mrows`, `ncols`, `imagf`, `namlen`), then the NUL-terminated name and
//! `mrows * ncols` values in column-major order. The thousands digit of
//! `type` selects byte order, the tens digit the element type.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use matfile::{MatFile, NumericData};

const HEADER_LEN: usize = 20;
const LEVEL5_HEADER_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    F64,
    F32,
    I32,
    I16,
    U16,
    U8,
}

impl Precision {
    fn from_digit(digit: i32) -> anyhow::Result<Self> {
        Ok(match digit {
            0 => Precision::F64,
            1 => Precision::F32,
            2 => Precision::I32,
            3 => Precision::I16,
            4 => Precision::U16,
            5 => Precision::U8,
            other => bail!("unsupported MAT v4 precision code {other}"),
        })
    }

    fn size(self) -> usize {
        match self {
            Precision::F64 => 8,
            Precision::F32 | Precision::I32 => 4,
            Precision::I16 | Precision::U16 => 2,
            Precision::U8 => 1,
        }
    }

    fn decode(self, bytes: &[u8], order: ByteOrder) -> f64 {
        macro_rules! read {
            ($ty:ty, $n:expr) => {{
                let mut buf = [0_u8; $n];
                buf.copy_from_slice(&bytes[..$n]);
                match order {
                    ByteOrder::Little => <$ty>::from_le_bytes(buf),
                    ByteOrder::Big => <$ty>::from_be_bytes(buf),
                }
            }};
        }

        match self {
            Precision::F64 => read!(f64, 8),
            Precision::F32 => f64::from(read!(f32, 4)),
            Precision::I32 => f64::from(read!(i32, 4)),
            Precision::I16 => f64::from(read!(i16, 2)),
            Precision::U16 => f64::from(read!(u16, 2)),
            Precision::U8 => f64::from(bytes[0]),
        }
    }
}

/// One variable of a MAT v4 file, real part only.
#[derive(Debug, Clone, PartialEq)]
pub struct MatVariable {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    /// Values in column-major order.
    pub data: Vec<f64>,
    /// Matrix type digit: 0 numeric, 1 text, 2 sparse.
    pub matrix_type: i32,
}

impl MatVariable {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[col * self.rows + row]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.get(r, c)).collect())
            .collect()
    }
}

/// Load the full numeric matrix `name` as rows.
pub fn read_matrix(path: &Path, name: &str) -> anyhow::Result<Vec<Vec<f64>>> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read MAT-file {}", path.display()))?;
    matrix_from_bytes(&bytes, name)
        .with_context(|| format!("failed to load '{name}' from {}", path.display()))
}

/// Level 5 or level 4, picked from the file header.
pub fn matrix_from_bytes(bytes: &[u8], name: &str) -> anyhow::Result<Vec<Vec<f64>>> {
    if is_level5(bytes) {
        return level5_matrix(bytes, name);
    }

    let variables = parse_mat4(bytes)?;
    let Some(var) = variables.into_iter().find(|v| v.name == name) else {
        bail!("variable '{name}' not found");
    };
    if var.matrix_type != 0 {
        bail!(
            "variable '{name}' is not a full numeric matrix (type digit {})",
            var.matrix_type
        );
    }
    Ok(var.to_rows())
}

/// Level 5 header: 116 text bytes, subsystem offset, version, endian tag.
fn is_level5(bytes: &[u8]) -> bool {
    bytes.len() >= LEVEL5_HEADER_LEN && matches!(&bytes[126..128], b"IM" | b"MI")
}

fn level5_matrix(bytes: &[u8], name: &str) -> anyhow::Result<Vec<Vec<f64>>> {
    let file = MatFile::parse(bytes).context("malformed level 5 MAT-file")?;
    let Some(array) = file.find_by_name(name) else {
        bail!("variable '{name}' not found (sparse and non-numeric arrays are skipped)");
    };

    let size = array.size();
    if size.len() != 2 {
        bail!("variable '{name}' has {} dimensions, expected 2", size.len());
    }
    let var = MatVariable {
        name: name.to_string(),
        rows: size[0],
        cols: size[1],
        data: real_part(array.data()),
        matrix_type: 0,
    };
    Ok(var.to_rows())
}

fn real_part(data: &NumericData) -> Vec<f64> {
    match data {
        NumericData::Int8 { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        NumericData::UInt8 { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        NumericData::Int16 { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        NumericData::UInt16 { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        NumericData::Int32 { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        NumericData::UInt32 { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        NumericData::Int64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Single { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        NumericData::Double { real, .. } => real.clone(),
    }
}

pub fn parse_mat4(bytes: &[u8]) -> anyhow::Result<Vec<MatVariable>> {
    let mut variables = Vec::new();
    let mut offset = 0_usize;

    while offset < bytes.len() {
        if bytes.len() - offset < HEADER_LEN {
            bail!("truncated variable header at byte {offset}");
        }
        let header = &bytes[offset..offset + HEADER_LEN];
        let order = detect_byte_order(header)?;
        let field = |idx: usize| -> i32 {
            let mut buf = [0_u8; 4];
            buf.copy_from_slice(&header[idx * 4..idx * 4 + 4]);
            match order {
                ByteOrder::Little => i32::from_le_bytes(buf),
                ByteOrder::Big => i32::from_be_bytes(buf),
            }
        };

        let type_code = field(0);
        let rows = non_negative(field(1), "mrows")?;
        let cols = non_negative(field(2), "ncols")?;
        let imag = field(3) != 0;
        let name_len = non_negative(field(4), "namlen")?;
        offset += HEADER_LEN;

        if (type_code / 100) % 10 != 0 {
            bail!("type code {type_code} has a non-zero reserved digit");
        }
        let precision = Precision::from_digit((type_code / 10) % 10)?;
        let matrix_type = type_code % 10;

        if bytes.len() - offset < name_len {
            bail!("truncated variable name at byte {offset}");
        }
        let raw_name = &bytes[offset..offset + name_len];
        let name_end = raw_name.iter().position(|&b| b == 0).unwrap_or(name_len);
        let name = String::from_utf8_lossy(&raw_name[..name_end]).into_owned();
        offset += name_len;

        let count = rows
            .checked_mul(cols)
            .context("matrix dimensions overflow")?;
        let part_len = count
            .checked_mul(precision.size())
            .context("matrix byte length overflows")?;
        let total_len = if imag {
            part_len
                .checked_mul(2)
                .context("matrix byte length overflows")?
        } else {
            part_len
        };
        if bytes.len() - offset < total_len {
            bail!("variable '{name}' data is truncated");
        }

        let data = bytes[offset..offset + part_len]
            .chunks_exact(precision.size())
            .map(|chunk| precision.decode(chunk, order))
            .collect();
        offset += total_len;

        variables.push(MatVariable {
            name,
            rows,
            cols,
            data,
            matrix_type,
        });
    }

    Ok(variables)
}

fn detect_byte_order(header: &[u8]) -> anyhow::Result<ByteOrder> {
    let mut buf = [0_u8; 4];
    buf.copy_from_slice(&header[..4]);
    let le = i32::from_le_bytes(buf);
    if (0..1000).contains(&le) {
        return Ok(ByteOrder::Little);
    }
    let be = i32::from_be_bytes(buf);
    if (1000..2000).contains(&be) {
        return Ok(ByteOrder::Big);
    }
    bail!("unsupported MAT v4 type code (le {le}, be {be}); only IEEE formats are read")
}

fn non_negative(value: i32, field: &str) -> anyhow::Result<usize> {
    usize::try_from(value).with_context(|| format!("negative {field} ({value}) in header"))
}
