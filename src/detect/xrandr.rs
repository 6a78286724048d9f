/// Generic provider name used when no AMD provider is found.
pub const FALLBACK_PROVIDER: &str = "modesetting";

/// Pick the AMD iGPU provider name out of `xrandr --listproviders` output.
///
/// Lines look like:
/// `Provider 0: id: 0x54 cap: 0xf, ... crtcs: 4 outputs: 1 associated providers: 1 name:Unknown AMD Radeon GPU @ pci:0000:05:00.0`
pub fn find_amd_provider(listproviders: &str) -> Option<String> {
    listproviders.lines().find_map(|line| {
        let (_, name) = line.split_once("name:")?;
        let name = name.trim();
        if name.contains("AMD") || name.contains("ATI") {
            Some(name.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_amd_provider() {
        let output = "\
Providers: number : 2
Provider 0: id: 0x54 cap: 0xf, Source Output, Sink Output, Source Offload, Sink Offload crtcs: 4 outputs: 1 associated providers: 1 name:Unknown AMD Radeon GPU @ pci:0000:05:00.0
Provider 1: id: 0x1f8 cap: 0x2, Sink Output crtcs: 4 outputs: 0 associated providers: 1 name:NVIDIA-G0
";
        assert_eq!(
            find_amd_provider(output).as_deref(),
            Some("Unknown AMD Radeon GPU @ pci:0000:05:00.0")
        );
    }

    #[test]
    fn test_find_amd_provider_none() {
        let output = "Providers: number : 1\nProvider 0: id: 0x43 cap: 0x9 name:modesetting\n";
        assert_eq!(find_amd_provider(output), None);
        assert_eq!(find_amd_provider(""), None);
    }
}
