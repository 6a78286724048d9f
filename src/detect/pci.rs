use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PCI address of the Nvidia GPU in the Xorg `BusID` format (`PCI:bus:device:function`,
/// all decimal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PciBusId {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciBusId {
    pub fn new(bus: u8, device: u8, function: u8) -> Self {
        Self {
            bus,
            device,
            function,
        }
    }

    /// Convert an lspci slot (`01:00.0`, or `0000:2d:00.0` with a domain)
    /// from hexadecimal to the decimal triple.
    pub fn from_slot(slot: &str) -> Result<Self> {
        let parse_err = |detail: &str| Error::Parse {
            input: slot.to_string(),
            detail: detail.to_string(),
        };

        // Xorg's BusID has no domain field, so only domain 0 is accepted.
        let without_domain = match slot.matches(':').count() {
            1 => slot,
            2 => {
                let (domain, rest) = slot
                    .split_once(':')
                    .ok_or_else(|| parse_err("malformed domain"))?;
                let domain =
                    u16::from_str_radix(domain, 16).map_err(|e| parse_err(&e.to_string()))?;
                if domain != 0 {
                    return Err(parse_err("PCI domains other than 0000 are not supported"));
                }
                rest
            }
            _ => return Err(parse_err("expected bus:device.function")),
        };

        let (bus, device_function) = without_domain
            .split_once(':')
            .ok_or_else(|| parse_err("missing ':'"))?;
        let (device, function) = device_function
            .split_once('.')
            .ok_or_else(|| parse_err("missing '.'"))?;

        let hex = |s: &str| u8::from_str_radix(s, 16).map_err(|e| parse_err(&e.to_string()));
        Ok(Self::new(hex(bus)?, hex(device)?, hex(function)?))
    }
}

impl fmt::Display for PciBusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PCI:{}:{}:{}", self.bus, self.device, self.function)
    }
}

impl FromStr for PciBusId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse_err = |detail: String| Error::Parse {
            input: s.to_string(),
            detail,
        };

        let rest = s
            .strip_prefix("PCI:")
            .ok_or_else(|| parse_err("expected 'PCI:' prefix".to_string()))?;
        let parts = rest
            .split(':')
            .map(|p| p.parse::<u8>().map_err(|e| parse_err(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        match parts.as_slice() {
            [bus, device, function] => Ok(Self::new(*bus, *device, *function)),
            _ => Err(parse_err("expected PCI:bus:device:function".to_string())),
        }
    }
}

impl TryFrom<String> for PciBusId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PciBusId> for String {
    fn from(id: PciBusId) -> Self {
        id.to_string()
    }
}

/// Vendor of the integrated GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgpuVendor {
    Intel,
    Amd,
}

impl fmt::Display for IgpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgpuVendor::Intel => write!(f, "intel"),
            IgpuVendor::Amd => write!(f, "amd"),
        }
    }
}

fn is_display_class(line: &str) -> bool {
    line.contains("VGA compatible controller") || line.contains("Display controller")
}

/// Find the slot of the first Nvidia VGA or 3D controller in `lspci` output.
pub fn find_nvidia_slot(lspci: &str) -> Option<&str> {
    lspci
        .lines()
        .find(|line| {
            line.contains("NVIDIA")
                && (line.contains("VGA compatible controller") || line.contains("3D controller"))
        })
        .and_then(|line| line.split_whitespace().next())
}

/// Identify the iGPU vendor from the first Intel or AMD display controller
/// in `lspci` output.
pub fn find_igpu_vendor(lspci: &str) -> Option<IgpuVendor> {
    lspci
        .lines()
        .filter(|line| is_display_class(line))
        .find_map(|line| {
            if line.contains("Intel") {
                Some(IgpuVendor::Intel)
            } else if line.contains("ATI") || line.contains("AMD") {
                Some(IgpuVendor::Amd)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTEL_NVIDIA: &str = "\
00:00.0 Host bridge: Intel Corporation 11th Gen Core Processor Host Bridge/DRAM Registers (rev 01)
00:02.0 VGA compatible controller: Intel Corporation TigerLake-H GT1 [UHD Graphics] (rev 01)
00:14.0 USB controller: Intel Corporation Tiger Lake-H USB 3.2 Gen 2x1 xHCI Host Controller (rev 11)
01:00.0 VGA compatible controller: NVIDIA Corporation GA107M [GeForce RTX 3050 Mobile] (rev a1)
01:00.1 Audio device: NVIDIA Corporation GA107 High Definition Audio Controller (rev a1)
";

    const AMD_NVIDIA: &str = "\
0000:00:00.0 Host bridge: Advanced Micro Devices, Inc. [AMD] Renoir/Cezanne Root Complex
0000:01:00.0 3D controller: NVIDIA Corporation TU117M [GeForce GTX 1650 Mobile / Max-Q] (rev a1)
0000:05:00.0 VGA compatible controller: Advanced Micro Devices, Inc. [AMD/ATI] Cezanne [Radeon Vega Series / Radeon Vega Mobile Series] (rev c6)
";

    #[test]
    fn test_from_slot_converts_hex() {
        assert_eq!(PciBusId::from_slot("01:00.0").unwrap(), PciBusId::new(1, 0, 0));
        assert_eq!(
            PciBusId::from_slot("0000:2d:00.0").unwrap(),
            PciBusId::new(45, 0, 0)
        );
        assert_eq!(
            PciBusId::from_slot("0a:1f.7").unwrap(),
            PciBusId::new(10, 31, 7)
        );
    }

    #[test]
    fn test_from_slot_rejects_garbage() {
        assert!(PciBusId::from_slot("nvidia").is_err());
        assert!(PciBusId::from_slot("01:00").is_err());
        assert!(PciBusId::from_slot("zz:00.0").is_err());
    }

    #[test]
    fn test_from_slot_rejects_nonzero_domain() {
        let err = PciBusId::from_slot("0001:01:00.0").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(PciBusId::from_slot("zzzz:01:00.0").is_err());
    }

    #[test]
    fn test_display_and_parse() {
        let id = PciBusId::new(45, 0, 0);
        assert_eq!(id.to_string(), "PCI:45:0:0");
        assert_eq!("PCI:1:0:0".parse::<PciBusId>().unwrap(), PciBusId::new(1, 0, 0));
        assert!("1:0:0".parse::<PciBusId>().is_err());
        assert!("PCI:1:0".parse::<PciBusId>().is_err());
    }

    #[test]
    fn test_find_nvidia_slot() {
        assert_eq!(find_nvidia_slot(INTEL_NVIDIA), Some("01:00.0"));
        assert_eq!(find_nvidia_slot(AMD_NVIDIA), Some("0000:01:00.0"));
        assert_eq!(
            find_nvidia_slot("00:02.0 VGA compatible controller: Intel Corporation UHD\n"),
            None
        );
    }

    #[test]
    fn test_find_nvidia_slot_ignores_audio_function() {
        let lspci = "01:00.1 Audio device: NVIDIA Corporation GA107 High Definition Audio\n";
        assert_eq!(find_nvidia_slot(lspci), None);
    }

    #[test]
    fn test_find_igpu_vendor() {
        assert_eq!(find_igpu_vendor(INTEL_NVIDIA), Some(IgpuVendor::Intel));
        assert_eq!(find_igpu_vendor(AMD_NVIDIA), Some(IgpuVendor::Amd));
        assert_eq!(
            find_igpu_vendor("01:00.0 3D controller: NVIDIA Corporation TU117M\n"),
            None
        );
    }
}
