use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

/// Slot count used when `SCRIPTBIND_MAX_SLOTS` is not set.
const DEFAULT_MAX_SLOTS: usize = 256;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SCRIPTBIND_MAX_SLOTS");

    let max_slots = match env::var("SCRIPTBIND_MAX_SLOTS") {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => panic!("SCRIPTBIND_MAX_SLOTS must be a positive integer, got {:?}", raw),
        },
        Err(_) => DEFAULT_MAX_SLOTS,
    };

    let mut src = String::new();
    writeln!(src, "/// Number of native handler slots, fixed at build time.").unwrap();
    writeln!(src, "pub const MAX_SLOTS: usize = {};", max_slots).unwrap();
    writeln!(src).unwrap();
    writeln!(src, "static TRAMPOLINES: [NativeFn; MAX_SLOTS] = [").unwrap();
    for slot in 0..max_slots {
        writeln!(src, "    trampoline::<{}>,", slot).unwrap();
    }
    writeln!(src, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("trampolines.rs"), src).unwrap();
}
