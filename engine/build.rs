use std::{env, fs::File, io::Write, path::Path};

fn main() {
    // write build time info
    built::write_built_file().expect("Failed to acquire build-time information");
    // unconditionally rerun this build script so build time info is always up to date
    #[cfg(not(debug_assertions))]
    println!("cargo:rerun-if-changed=foobaz");

    // the witness search tuning params can be overridden through env vars.
    // If the env var is set, we write its value to a file in OUT_DIR and enable a cfg flag.
    // The witness search module falls back to its default value when the flag is not set.
    let out_dir = env::var("OUT_DIR").unwrap();

    override_param(&out_dir, "WITNESS_SIGMA_FACTOR", "override_witness_sigma_factor");
    override_param(&out_dir, "WITNESS_MIN_MAX_SETTLED_EDGES", "override_witness_min_max_settled_edges");
    override_param(&out_dir, "WITNESS_STATS_RESET_INTERVAL", "override_witness_stats_reset_interval");
}

fn override_param(out_dir: &str, var: &str, cfg: &str) {
    if let Ok(val) = env::var(var) {
        let dest_path = Path::new(out_dir).join(var);
        let mut f = File::create(&dest_path).unwrap();
        f.write_all(val.as_bytes()).unwrap();
        println!("cargo:rustc-cfg={}", cfg);
    }
    println!("cargo:rerun-if-env-changed={}", var);
}
