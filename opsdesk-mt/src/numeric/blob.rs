//! Byte-blob codec for persisted model parameters
//!
//! A blob holds two length-prefixed arrays back to back: the weight
//! vector, then a single-element array carrying the bias. Each array is a
//! little-endian u32 element count followed by that many little-endian
//! f32 values.

use opsdesk_common::{Error, Result};

pub fn encode_weights(weights: &[f32], bias: f32) -> Vec<u8> {
    let mut blob = Vec::with_capacity(8 + (weights.len() + 1) * 4);
    append_array(&mut blob, weights);
    append_array(&mut blob, &[bias]);
    blob
}

pub fn decode_weights(blob: &[u8]) -> Result<(Vec<f32>, f32)> {
    let mut offset = 0usize;
    let weights = read_array(blob, &mut offset)?;
    let bias_array = read_array(blob, &mut offset)?;

    if bias_array.len() != 1 {
        return Err(Error::InvalidInput(format!(
            "expected a single bias value, got {}",
            bias_array.len()
        )));
    }
    if offset != blob.len() {
        return Err(Error::InvalidInput(format!(
            "trailing bytes after bias array: {} unread",
            blob.len() - offset
        )));
    }

    Ok((weights, bias_array[0]))
}

fn append_array(blob: &mut Vec<u8>, values: &[f32]) {
    blob.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for value in values {
        blob.extend_from_slice(&value.to_le_bytes());
    }
}

fn read_array(blob: &[u8], offset: &mut usize) -> Result<Vec<f32>> {
    let count_end = offset
        .checked_add(4)
        .filter(|end| *end <= blob.len())
        .ok_or_else(|| Error::InvalidInput("blob truncated in array length".to_string()))?;
    let mut count_bytes = [0u8; 4];
    count_bytes.copy_from_slice(&blob[*offset..count_end]);
    let count = u32::from_le_bytes(count_bytes) as usize;
    *offset = count_end;

    let data_end = count
        .checked_mul(4)
        .and_then(|len| offset.checked_add(len))
        .filter(|end| *end <= blob.len())
        .ok_or_else(|| Error::InvalidInput("blob truncated in array data".to_string()))?;

    let mut values = Vec::with_capacity(count);
    for chunk_start in (*offset..data_end).step_by(4) {
        let mut value_bytes = [0u8; 4];
        value_bytes.copy_from_slice(&blob[chunk_start..chunk_start + 4]);
        values.push(f32::from_le_bytes(value_bytes));
    }
    *offset = data_end;

    Ok(values)
}
