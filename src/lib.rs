//! cue-sops - Encrypt the secret fields of CUE files in place.
//!
//! Fields tagged `@secret()` have their values replaced by sops-style
//! `ENC[...]` envelopes; everything else, comments and layout included, is
//! left byte for byte. A `sops` metadata block appended to the file holds
//! the wrapped data key, so the same file can be decrypted again.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── encrypt       # Encrypt a file in place
//! │   ├── decrypt       # Decrypt a file in place
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── document/     # Lossless CUE parser, renderer and visitor
//!     ├── path          # Field paths and selectors
//!     ├── locate        # Secret field discovery
//!     ├── envelope/     # Encode/decode of plain-data trees
//!     ├── cipher/       # age and AES-GCM primitives
//!     ├── keyservice/   # Data key custody (age, stub)
//!     ├── config        # .sops.yaml creation policy
//!     ├── splice        # Weave envelope values back into the document
//!     ├── metadata      # sops block attach/detach
//!     └── transform     # Encrypt/decrypt pipelines
//! ```

pub mod cli;
pub mod core;
pub mod error;
