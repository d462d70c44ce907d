//! URL path canonicalisation.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Returns the canonical form of a URL path.
///
/// Empty input yields `/` and a leading `/` is guaranteed. Runs of `/`
/// collapse to one, `.` segments are dropped and `..` segments pop the
/// previous segment without ever walking above the root. A trailing slash is
/// kept when the input ended in `/`, `/.` or `/..`.
///
/// Allocates only when the input is not already canonical.
///
/// ```rust
/// use turnpike::path::clean;
///
/// assert_eq!(clean("//users/../home"), "/home");
/// assert_eq!(clean("/users/42/"), "/users/42/");
/// ```
pub fn clean(p: &str) -> Cow<'_, str> {
    if p.is_empty() {
        return Cow::Borrowed("/");
    }

    let s = p.as_bytes();
    let n = s.len();

    // The output is read straight from the input until the two diverge, then
    // written into `buf`. `r` is the next byte to read, `w` the next to write.
    let mut buf: Option<Vec<u8>> = None;
    let mut r = 1;
    let mut w = 1;

    if s[0] != b'/' {
        r = 0;
        buf = Some(vec![b'/']);
    }

    let mut trailing = n > 1 && s[n - 1] == b'/';

    while r < n {
        match s[r] {
            b'/' => r += 1,
            b'.' if r + 1 == n => {
                trailing = true;
                r += 1;
            }
            b'.' if s[r + 1] == b'/' => r += 2,
            b'.' if s[r + 1] == b'.' && (r + 2 == n || s[r + 2] == b'/') => {
                r += 3;

                // Walk the write position back to the previous '/'.
                if w > 1 {
                    w -= 1;
                    match buf {
                        None => {
                            while w > 1 && s[w] != b'/' {
                                w -= 1;
                            }
                        }
                        Some(ref b) => {
                            while w > 1 && b[w] != b'/' {
                                w -= 1;
                            }
                        }
                    }
                }
            }
            _ => {
                if w > 1 {
                    buf_app(&mut buf, s, w, b'/');
                    w += 1;
                }

                while r < n && s[r] != b'/' {
                    buf_app(&mut buf, s, w, s[r]);
                    w += 1;
                    r += 1;
                }
            }
        }
    }

    if trailing && w > 1 {
        buf_app(&mut buf, s, w, b'/');
        w += 1;
    }

    match buf {
        None => Cow::Borrowed(&p[..w]),
        Some(mut b) => {
            b.truncate(w);
            Cow::Owned(String::from_utf8(b).unwrap())
        }
    }
}

// Writes `c` at position `w` of the output, leaving the zero-copy fast path
// on the first byte that differs from the input.
fn buf_app(buf: &mut Option<Vec<u8>>, s: &[u8], w: usize, c: u8) {
    match buf {
        None if s[w] == c => {}
        None => {
            let mut b = Vec::with_capacity(s.len() + 1);
            b.extend_from_slice(&s[..w]);
            b.push(c);
            *buf = Some(b);
        }
        Some(b) => {
            b.truncate(w);
            b.push(c);
        }
    }
}

/// Percent-decodes an extracted parameter value.
///
/// Malformed escapes, and decodes that would not be valid UTF-8, yield the
/// raw text unchanged.
pub(crate) fn unescape(v: &str) -> Cow<'_, str> {
    match percent_decode_str(v).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(v),
    }
}
