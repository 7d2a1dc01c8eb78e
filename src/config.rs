/// Size of the transmit ring used by the board builds.
pub const TX_BUFFER_SIZE: usize = 64;

pub const DEFAULT_BAUD_RATE: BaudRate = BaudRate::Baud115200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The UARTE can't generate this rate.
    UnsupportedBaudRate(u32),
}

/// Rates the nRF52 UARTE can generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudRate {
    Baud1200,
    Baud2400,
    Baud4800,
    Baud9600,
    Baud14400,
    Baud19200,
    Baud28800,
    Baud31250,
    Baud38400,
    Baud56000,
    Baud57600,
    Baud76800,
    Baud115200,
    Baud230400,
    Baud250000,
    Baud460800,
    Baud921600,
    Baud1M,
}

impl BaudRate {
    pub fn from_bps(bps: u32) -> Result<Self, Error> {
        let rate = match bps {
            1200 => BaudRate::Baud1200,
            2400 => BaudRate::Baud2400,
            4800 => BaudRate::Baud4800,
            9600 => BaudRate::Baud9600,
            14400 => BaudRate::Baud14400,
            19200 => BaudRate::Baud19200,
            28800 => BaudRate::Baud28800,
            31250 => BaudRate::Baud31250,
            38400 => BaudRate::Baud38400,
            56000 => BaudRate::Baud56000,
            57600 => BaudRate::Baud57600,
            76800 => BaudRate::Baud76800,
            115200 => BaudRate::Baud115200,
            230400 => BaudRate::Baud230400,
            250000 => BaudRate::Baud250000,
            460800 => BaudRate::Baud460800,
            921600 => BaudRate::Baud921600,
            1_000_000 => BaudRate::Baud1M,
            other => return Err(Error::UnsupportedBaudRate(other)),
        };
        Ok(rate)
    }

    pub fn bps(self) -> u32 {
        match self {
            BaudRate::Baud1200 => 1200,
            BaudRate::Baud2400 => 2400,
            BaudRate::Baud4800 => 4800,
            BaudRate::Baud9600 => 9600,
            BaudRate::Baud14400 => 14400,
            BaudRate::Baud19200 => 19200,
            BaudRate::Baud28800 => 28800,
            BaudRate::Baud31250 => 31250,
            BaudRate::Baud38400 => 38400,
            BaudRate::Baud56000 => 56000,
            BaudRate::Baud57600 => 57600,
            BaudRate::Baud76800 => 76800,
            BaudRate::Baud115200 => 115200,
            BaudRate::Baud230400 => 230400,
            BaudRate::Baud250000 => 250000,
            BaudRate::Baud460800 => 460800,
            BaudRate::Baud921600 => 921600,
            BaudRate::Baud1M => 1_000_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    /// Requested rate in bits per second.
    pub baud_rate: u32,
    /// Arm the receiver at start-up and after every byte read.
    pub rx_interrupt: bool,
}

impl SerialConfig {
    /// The rate to program, falling back to 115200 for rates the
    /// hardware doesn't have.
    pub fn baud_rate(&self) -> BaudRate {
        match BaudRate::from_bps(self.baud_rate) {
            Ok(rate) => rate,
            Err(_) => {
                error!(
                    "Baudrate {=u32} isn't supported. Using default 115200.",
                    self.baud_rate
                );
                DEFAULT_BAUD_RATE
            }
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE.bps(),
            rx_interrupt: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rate_maps_back_to_itself() {
        for bps in [
            1200, 2400, 4800, 9600, 14400, 19200, 28800, 31250, 38400, 56000, 57600, 76800,
            115200, 230400, 250000, 460800, 921600, 1_000_000,
        ] {
            assert_eq!(BaudRate::from_bps(bps).map(BaudRate::bps), Ok(bps));
        }
    }

    #[test]
    fn unsupported_rate_falls_back() {
        assert_eq!(
            BaudRate::from_bps(12345),
            Err(Error::UnsupportedBaudRate(12345))
        );

        let config = SerialConfig {
            baud_rate: 12345,
            ..SerialConfig::default()
        };
        assert_eq!(config.baud_rate(), BaudRate::Baud115200);
    }

    #[test]
    fn defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate(), BaudRate::Baud115200);
        assert!(config.rx_interrupt);
    }
}
