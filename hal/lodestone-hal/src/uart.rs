//! UART serial communication abstractions
//!
//! Blocking byte-stream traits. Implementations spin on the peripheral's
//! status flags; none of them yield.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until every byte has been handed to the shifter or an error
    /// occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until the last byte written has left the data register
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Non-blocking check for a received byte
    fn read_ready(&mut self) -> Result<bool, Self::Error>;

    /// Read data from the UART
    ///
    /// Blocks until the buffer is filled or an error occurs.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single byte from the UART
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_blocking(&mut buf)?;
        Ok(buf[0])
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echo UART: every written byte becomes readable
    struct Echo {
        buf: [u8; 8],
        head: usize,
        tail: usize,
    }

    impl UartTx for Echo {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            for &b in data {
                if self.head == self.buf.len() {
                    return Err(());
                }
                self.buf[self.head] = b;
                self.head += 1;
            }
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    impl UartRx for Echo {
        type Error = ();

        fn read_ready(&mut self) -> Result<bool, ()> {
            Ok(self.tail < self.head)
        }

        fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            for slot in buf.iter_mut() {
                if self.tail == self.head {
                    return Err(());
                }
                *slot = self.buf[self.tail];
                self.tail += 1;
            }
            Ok(buf.len())
        }
    }

    #[test]
    fn test_read_byte_default() {
        let mut uart = Echo {
            buf: [0; 8],
            head: 0,
            tail: 0,
        };

        assert_eq!(uart.read_ready(), Ok(false));
        uart.write_blocking(b"ok").unwrap();
        assert_eq!(uart.read_ready(), Ok(true));
        assert_eq!(uart.read_byte(), Ok(b'o'));
        assert_eq!(uart.read_byte(), Ok(b'k'));
        assert_eq!(uart.read_byte(), Err(()));
    }
}
