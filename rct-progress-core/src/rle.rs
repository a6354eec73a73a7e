use log::debug;

// A literal control byte c (0..=127) copies c + 1 bytes.
const MAX_LITERAL: usize = 128;
// A repeat control byte c (-128..=-1) emits the next byte 1 - c times.
const MAX_REPEAT: usize = 129;

/// Result of expanding a run-length stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decompressed {
    pub data: Vec<u8>,
    /// Offset of the control byte whose run ran past the end of the input,
    /// if the stream was truncated.
    pub truncated_at: Option<usize>,
}

/// Expands a run-length stream (checksum already stripped).
///
/// Malformed input never fails: a literal run that claims more bytes than
/// remain copies what is left, and a repeat run with no value byte emits
/// nothing. Decoding stops at either point.
pub fn decompress_report(body: &[u8]) -> Decompressed {
    let mut out = Vec::with_capacity(body.len().saturating_mul(2));
    let mut pos = 0usize;
    let mut truncated_at = None;

    while let Some(&control) = body.get(pos) {
        let control_pos = pos;
        pos += 1;

        let c = control as i8;
        if c >= 0 {
            let wanted = c as usize + 1;
            let end = pos.saturating_add(wanted).min(body.len());
            out.extend_from_slice(&body[pos..end]);
            if end - pos < wanted {
                debug!(
                    "literal run at 0x{:X} wants {} bytes, only {} remain",
                    control_pos,
                    wanted,
                    end - pos
                );
                truncated_at = Some(control_pos);
                break;
            }
            pos = end;
        } else {
            let Some(&value) = body.get(pos) else {
                debug!("repeat run at 0x{:X} is missing its value byte", control_pos);
                truncated_at = Some(control_pos);
                break;
            };
            pos += 1;

            let count = (1 - i32::from(c)) as usize;
            out.resize(out.len() + count, value);
        }
    }

    Decompressed { data: out, truncated_at }
}

pub fn decompress(body: &[u8]) -> Vec<u8> {
    decompress_report(body).data
}

/// Greedy encoder producing a stream `decompress` expands back to `data`.
/// Runs of two or more equal bytes become repeat units.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_LITERAL + 1);
    let mut literal_start = 0usize;
    let mut i = 0usize;

    while i < data.len() {
        let value = data[i];
        let run = data[i..]
            .iter()
            .take(MAX_REPEAT)
            .take_while(|&&b| b == value)
            .count();

        if run >= 2 {
            push_literals(&mut out, &data[literal_start..i]);
            out.push((1 - run as i32) as i8 as u8);
            out.push(value);
            i += run;
            literal_start = i;
        } else {
            i += 1;
        }
    }

    push_literals(&mut out, &data[literal_start..]);
    out
}

fn push_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_LITERAL) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}
