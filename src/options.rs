use std::sync::OnceLock;

/// Process-wide configuration knobs.
///
/// The options record is installed at most once, before any geometry is
/// constructed; later reads observe either the installed record or the
/// defaults. This replaces scattered globals with a single enumerated
/// record.
#[derive(Debug, Clone)]
pub struct Options {
    /// Build the spatial index only when it is first needed. This can save
    /// significant amounts of memory and time when geometry is constructed
    /// but never queried, for example when geometry is being converted from
    /// one format to another.
    pub lazy_indexing: bool,

    /// The upper limit on the number of vertices allowed by the loop decode
    /// methods.
    pub decode_max_num_vertices: u32,

    /// If set, loop construction validates the result and panics on invalid
    /// input unless suppressed by a per-instance override. Off by default in
    /// optimized builds.
    pub debug_validation: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            lazy_indexing: true,
            decode_max_num_vertices: 50_000_000,
            debug_validation: false,
        }
    }
}

static OPTIONS: OnceLock<Options> = OnceLock::new();

impl Options {
    /// Installs this record as the process-wide configuration. Returns false
    /// if a record has already been installed.
    pub fn install(self) -> bool {
        OPTIONS.set(self).is_ok()
    }

    /// The installed configuration, or the defaults if none was installed.
    pub fn global() -> &'static Options {
        OPTIONS.get_or_init(Options::default)
    }
}

/// Per-instance override of the `debug_validation` option.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DebugOverride {
    /// Follow the process-wide `debug_validation` setting.
    Allow,
    /// Never validate this instance on construction.
    Disable,
}
