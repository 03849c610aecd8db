use std::fmt;

/// A string of constant size that implements the Copy-trait.
///
/// Used for the id types (`CourierId`, `OrderId`, `RestaurantId`): they are
/// copied into many dense index maps during preprocessing, and a `String`
/// there would mean an allocation per copy.
#[derive(Hash, Eq, PartialEq, Copy, Clone, PartialOrd, Ord)]
pub struct CopyStr<const N: usize> {
    code: [u8; N],
    len: usize,
}

impl<const N: usize> CopyStr<N> {
    pub fn from(string: &str) -> Self {
        let raw = string.as_bytes();
        let len = raw.len();
        if len > N {
            panic!("Content for CopyStr is too long: {}; max: {}", string, N);
        }

        let mut writable: [u8; N] = [0; N];
        let (writearea, _) = writable.split_at_mut(len);
        writearea.copy_from_slice(raw);

        CopyStr {
            code: writable,
            len,
        }
    }

    pub fn as_str(&self) -> &str {
        let (s, _) = self.code.split_at(self.len);
        std::str::from_utf8(s).expect("Invalid UTF8.")
    }
}

impl<const N: usize> fmt::Display for CopyStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<const N: usize> fmt::Debug for CopyStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
