//! Hardware entropy source

/// Source of 32-bit random words
///
/// Implementations block until the hardware has a fresh word.
pub trait RandomSource {
    /// Error type for a word that never became ready
    type Error;

    /// Return the next random word
    fn next_u32(&mut self) -> Result<u32, Self::Error>;

    /// Fill `dest` with random bytes, little-endian word by word
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Self::Error> {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_u32()?.to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        Ok(())
    }
}
