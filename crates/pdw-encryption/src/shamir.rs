//! A classic `(t, n)` Shamir secret-sharing scheme over GF(2^8), applied
//! byte-wise to 32-byte secrets. Used to split a data-encryption key across
//! the key-server fleet so no fewer than `threshold` servers can ever
//! reconstruct it.

use rand::RngCore;

use pdw_core::errors::{ErrorKind, PdwError, PdwResult};

const SECRET_LEN: usize = 32;

/// GF(2^8) arithmetic using the AES reduction polynomial, the same field
/// used by the classic Shamir reference construction.
mod gf256 {
    pub fn add(a: u8, b: u8) -> u8 {
        a ^ b
    }

    pub fn mul(mut a: u8, mut b: u8) -> u8 {
        let mut p = 0u8;
        for _ in 0..8 {
            if b & 1 != 0 {
                p ^= a;
            }
            let hi = a & 0x80;
            a <<= 1;
            if hi != 0 {
                a ^= 0x1b;
            }
            b >>= 1;
        }
        p
    }

    pub fn inv(a: u8) -> u8 {
        // GF(2^8)* has order 255; a^254 == a^-1 for a != 0.
        let mut result = 1u8;
        let mut base = a;
        let mut exp = 254u8;
        while exp > 0 {
            if exp & 1 != 0 {
                result = mul(result, base);
            }
            base = mul(base, base);
            exp >>= 1;
        }
        result
    }

    pub fn div(a: u8, b: u8) -> u8 {
        mul(a, inv(b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShamirShare {
    pub server_index: u8,
    pub bytes: [u8; SECRET_LEN],
}

/// Split `secret` into `total` shares such that any `threshold` of them
/// reconstruct it, and any `threshold - 1` reveal nothing.
pub fn split(secret: &[u8; SECRET_LEN], threshold: u8, total: u8) -> PdwResult<Vec<ShamirShare>> {
    if threshold == 0 || total == 0 || threshold > total {
        return Err(PdwError::invalid_input(format!(
            "invalid shamir parameters: threshold={threshold}, total={total}"
        )));
    }
    if total >= 255 {
        return Err(PdwError::invalid_input("shamir share count must be < 255 (x=0 is reserved)"));
    }

    let mut rng = rand::thread_rng();
    // One degree-(threshold-1) polynomial per secret byte, constant term = that byte.
    let mut coefficients = vec![[0u8; SECRET_LEN]; threshold as usize];
    coefficients[0] = *secret;
    for coeff_byte in coefficients.iter_mut().skip(1) {
        rng.fill_bytes(coeff_byte);
    }

    let mut shares = Vec::with_capacity(total as usize);
    for server_index in 1..=total {
        let x = server_index;
        let mut y = [0u8; SECRET_LEN];
        for byte_pos in 0..SECRET_LEN {
            let mut acc = 0u8;
            let mut x_pow = 1u8;
            for coeff in &coefficients {
                acc = gf256::add(acc, gf256::mul(coeff[byte_pos], x_pow));
                x_pow = gf256::mul(x_pow, x);
            }
            y[byte_pos] = acc;
        }
        shares.push(ShamirShare { server_index: x, bytes: y });
    }
    Ok(shares)
}

/// Reconstruct the secret from `shares` via Lagrange interpolation at x=0.
/// Fails closed (`Unauthorized`) on too few shares rather than silently
/// returning garbage.
pub fn combine(shares: &[ShamirShare], threshold: u8) -> PdwResult<[u8; SECRET_LEN]> {
    if shares.len() < threshold as usize {
        return Err(PdwError::unauthorized(format!(
            "{} of {} required key shares collected",
            shares.len(),
            threshold
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for s in shares {
        if !seen.insert(s.server_index) {
            return Err(PdwError::new(ErrorKind::Internal, "duplicate shamir share index"));
        }
    }

    let mut secret = [0u8; SECRET_LEN];
    for byte_pos in 0..SECRET_LEN {
        let mut acc = 0u8;
        for (i, share_i) in shares.iter().enumerate() {
            let mut num = 1u8;
            let mut den = 1u8;
            for (j, share_j) in shares.iter().enumerate() {
                if i == j {
                    continue;
                }
                num = gf256::mul(num, share_j.server_index);
                den = gf256::mul(den, gf256::add(share_j.server_index, share_i.server_index));
            }
            let lagrange_coeff = gf256::div(num, den);
            acc = gf256::add(acc, gf256::mul(share_i.bytes[byte_pos], lagrange_coeff));
        }
        secret[byte_pos] = acc;
    }
    Ok(secret)
}
