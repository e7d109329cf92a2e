use std::ops::Range;

/// Build-time-selected capability for introspecting the running process's
/// executable image. Keeps the orchestration in `ProtectionController`
/// platform-agnostic; errors are plain strings describing the failed probe.
pub trait ProcessImage {
    /// Raw bytes of the code-bearing section of the loaded executable.
    fn text_section(&self) -> Result<Vec<u8>, String>;

    /// Address ranges currently mapped executable in this process.
    fn executable_ranges(&self) -> Result<Vec<Range<usize>>, String>;

    /// Target addresses currently held in the executable's resolved import
    /// slots. Zero entries are unresolved (lazy) slots.
    fn import_slot_targets(&self) -> Result<Vec<usize>, String>;
}

#[cfg(target_os = "linux")]
pub type HostImage = linux::LinuxImage;
#[cfg(not(target_os = "linux"))]
pub type HostImage = fallback::FallbackImage;

pub fn host_image() -> HostImage {
    HostImage::default()
}

#[cfg(target_os = "linux")]
mod linux {
    use std::ops::Range;
    use std::path::PathBuf;

    use goblin::elf::header::ET_DYN;
    use goblin::elf::Elf;

    use super::ProcessImage;

    const SELF_EXE: &str = "/proc/self/exe";
    const SELF_MAPS: &str = "/proc/self/maps";
    const TEXT_SECTION: &str = ".text";

    #[derive(Debug, Default)]
    pub struct LinuxImage;

    impl ProcessImage for LinuxImage {
        fn text_section(&self) -> Result<Vec<u8>, String> {
            let binary = std::fs::read(SELF_EXE)
                .map_err(|err| format!("read {}: {}", SELF_EXE, err))?;
            let elf = Elf::parse(&binary)
                .map_err(|err| format!("parse elf executable {}: {}", SELF_EXE, err))?;

            for header in &elf.section_headers {
                let Some(name) = elf.shdr_strtab.get_at(header.sh_name) else {
                    continue;
                };
                if name != TEXT_SECTION {
                    continue;
                }

                let start = usize::try_from(header.sh_offset)
                    .map_err(|_| format!("section '{}' offset out of range", name))?;
                let size = usize::try_from(header.sh_size)
                    .map_err(|_| format!("section '{}' size out of range", name))?;
                let end = start
                    .checked_add(size)
                    .ok_or_else(|| format!("section '{}' range overflow", name))?;
                if end > binary.len() {
                    return Err(format!(
                        "section '{}' exceeds executable size (end={} size={})",
                        name,
                        end,
                        binary.len()
                    ));
                }

                return Ok(binary[start..end].to_vec());
            }

            Err(format!("required section '{}' not found", TEXT_SECTION))
        }

        fn executable_ranges(&self) -> Result<Vec<Range<usize>>, String> {
            let maps = std::fs::read_to_string(SELF_MAPS)
                .map_err(|err| format!("read {}: {}", SELF_MAPS, err))?;
            Ok(super::parse_executable_ranges(&maps))
        }

        fn import_slot_targets(&self) -> Result<Vec<usize>, String> {
            let binary = std::fs::read(SELF_EXE)
                .map_err(|err| format!("read {}: {}", SELF_EXE, err))?;
            let elf = Elf::parse(&binary)
                .map_err(|err| format!("parse elf executable {}: {}", SELF_EXE, err))?;

            let bias = if elf.header.e_type == ET_DYN {
                self.load_bias()?
            } else {
                0
            };

            let mut targets = Vec::with_capacity(elf.pltrelocs.len());
            for reloc in elf.pltrelocs.iter() {
                let offset = usize::try_from(reloc.r_offset)
                    .map_err(|_| "relocation offset out of range".to_string())?;
                let slot = bias
                    .checked_add(offset)
                    .ok_or_else(|| "relocation address overflow".to_string())?;

                // SAFETY: the slot address is an entry of this process's own
                // GOT, derived from the mapped executable's dynamic
                // relocations plus its load bias, so it is readable for the
                // lifetime of the process.
                let target = unsafe { std::ptr::read_volatile(slot as *const usize) };
                targets.push(target);
            }
            Ok(targets)
        }
    }

    impl LinuxImage {
        fn load_bias(&self) -> Result<usize, String> {
            let exe: PathBuf = std::fs::read_link(SELF_EXE)
                .map_err(|err| format!("readlink {}: {}", SELF_EXE, err))?;
            let maps = std::fs::read_to_string(SELF_MAPS)
                .map_err(|err| format!("read {}: {}", SELF_MAPS, err))?;

            super::parse_module_base(&maps, &exe.to_string_lossy())
                .ok_or_else(|| format!("no mapping found for {}", exe.display()))
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod fallback {
    use std::ops::Range;

    use super::ProcessImage;

    /// Conservative stand-in for platforms without an introspection backend:
    /// every probe reports its own absence instead of fabricating results,
    /// so callers degrade to the permissive defaults rather than raising
    /// false tamper alarms.
    #[derive(Debug, Default)]
    pub struct FallbackImage;

    impl ProcessImage for FallbackImage {
        fn text_section(&self) -> Result<Vec<u8>, String> {
            Err("executable section introspection is not supported on this platform".to_string())
        }

        fn executable_ranges(&self) -> Result<Vec<Range<usize>>, String> {
            Ok(Vec::new())
        }

        fn import_slot_targets(&self) -> Result<Vec<usize>, String> {
            Ok(Vec::new())
        }
    }
}

/// Parse `/proc/self/maps` content into the executable address ranges.
pub(crate) fn parse_executable_ranges(maps: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    for line in maps.lines() {
        let mut fields = line.split_whitespace();
        let (Some(span), Some(perms)) = (fields.next(), fields.next()) else {
            continue;
        };
        if !perms.contains('x') {
            continue;
        }
        let Some((start, end)) = span.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            usize::from_str_radix(start, 16),
            usize::from_str_radix(end, 16),
        ) else {
            continue;
        };
        if start < end {
            ranges.push(start..end);
        }
    }
    ranges
}

/// Lowest mapped address of the module at `path`, i.e. its load bias for
/// position-independent executables.
pub(crate) fn parse_module_base(maps: &str, path: &str) -> Option<usize> {
    let mut base: Option<usize> = None;
    for line in maps.lines() {
        let mut fields = line.split_whitespace();
        let Some(span) = fields.next() else {
            continue;
        };
        // Remaining fields: perms, offset, dev, inode, pathname.
        let Some(module) = fields.nth(4) else {
            continue;
        };
        if module != path {
            continue;
        }
        let Some((start, _)) = span.split_once('-') else {
            continue;
        };
        let Ok(start) = usize::from_str_radix(start, 16) else {
            continue;
        };
        base = Some(base.map_or(start, |current| current.min(start)));
    }
    base
}
