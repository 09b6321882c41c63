//! Static lookup tables for well-known system packages.
//!
//! These are declarative data assets, kept separate from the resolution and
//! migration logic so they can be extended without touching algorithmic code.

/// Platform-specific install commands for one package.
pub struct InstallRecipe {
    pub platform: &'static str,
    pub commands: &'static [&'static str],
}

/// Distro/package-manager names mapped to their canonical DepURLs.
pub const PACKAGE_DEPURLS: &[(&str, &str)] = &[
    // Audio/Video
    ("ffmpeg", "dep:generic/ffmpeg"),
    ("libsndfile", "dep:generic/libsndfile"),
    ("libsndfile1", "dep:generic/libsndfile"),
    ("portaudio", "dep:generic/portaudio"),
    ("portaudio19-dev", "dep:generic/portaudio"),
    ("libportaudio2", "dep:generic/portaudio"),
    // Development tools
    ("git", "dep:generic/git"),
    ("make", "dep:generic/make"),
    ("cmake", "dep:generic/cmake"),
    ("gcc", "dep:virtual/compiler/c"),
    ("g++", "dep:virtual/compiler/cpp"),
    ("clang", "dep:virtual/compiler/c"),
    // Database/ODBC
    ("unixodbc", "dep:generic/unixodbc"),
    ("unixodbc-dev", "dep:generic/unixodbc"),
    ("msodbcsql18", "dep:generic/msodbcsql18"),
    ("postgresql", "dep:generic/postgresql"),
    ("libpq-dev", "dep:generic/postgresql"),
    ("mysql", "dep:generic/mysql"),
    ("libmysqlclient-dev", "dep:generic/mysql"),
    // Libraries
    ("libffi", "dep:generic/libffi"),
    ("libffi-dev", "dep:generic/libffi"),
    ("libssl", "dep:generic/openssl"),
    ("libssl-dev", "dep:generic/openssl"),
    ("openssl", "dep:generic/openssl"),
    ("zlib", "dep:generic/zlib"),
    ("zlib1g-dev", "dep:generic/zlib"),
    // Other
    ("curl", "dep:generic/curl"),
    ("wget", "dep:generic/wget"),
    ("docker", "dep:generic/docker"),
];

/// Default install commands for common packages, keyed by simple name.
pub const INSTALL_RECIPES: &[(&str, &[InstallRecipe])] = &[
    (
        "ffmpeg",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &["sudo apt-get install -y ffmpeg"],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install ffmpeg"],
            },
            InstallRecipe {
                platform: "windows",
                commands: &["choco install ffmpeg"],
            },
        ],
    ),
    (
        "libsndfile",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &["sudo apt-get install -y libsndfile1"],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install libsndfile"],
            },
        ],
    ),
    (
        "portaudio",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &["sudo apt-get install -y libportaudio2 portaudio19-dev"],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install portaudio"],
            },
            InstallRecipe {
                platform: "windows",
                commands: &["choco install portaudio"],
            },
        ],
    ),
    (
        "git",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &["sudo apt-get install -y git"],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install git"],
            },
            InstallRecipe {
                platform: "windows",
                commands: &["choco install git"],
            },
        ],
    ),
    (
        "unixodbc",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &[
                    "sudo apt-get update",
                    "sudo apt-get install -y unixodbc unixodbc-dev",
                ],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install unixodbc"],
            },
        ],
    ),
    (
        "postgresql",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &["sudo apt-get install -y postgresql libpq-dev"],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install postgresql"],
            },
            InstallRecipe {
                platform: "windows",
                commands: &["choco install postgresql"],
            },
        ],
    ),
    (
        "mysql",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &["sudo apt-get install -y mysql-server libmysqlclient-dev"],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install mysql"],
            },
            InstallRecipe {
                platform: "windows",
                commands: &["choco install mysql"],
            },
        ],
    ),
    (
        "openssl",
        &[
            InstallRecipe {
                platform: "linux",
                commands: &["sudo apt-get install -y libssl-dev"],
            },
            InstallRecipe {
                platform: "macos",
                commands: &["brew install openssl"],
            },
            InstallRecipe {
                platform: "windows",
                commands: &["choco install openssl"],
            },
        ],
    ),
];

/// Human-facing metadata: (simple name, rationale, homepage URL).
pub const PACKAGE_METADATA: &[(&str, &str, &str)] = &[
    (
        "ffmpeg",
        "Multimedia framework for audio and video processing",
        "https://ffmpeg.org/",
    ),
    (
        "libsndfile",
        "Library for reading and writing audio files",
        "http://www.mega-nerd.com/libsndfile/",
    ),
    (
        "portaudio",
        "Cross-platform audio I/O library",
        "http://www.portaudio.com/",
    ),
    (
        "git",
        "Distributed version control system",
        "https://git-scm.com/",
    ),
    (
        "unixodbc",
        "ODBC driver interface for database connectivity",
        "https://www.unixodbc.org/",
    ),
    (
        "postgresql",
        "PostgreSQL database and client libraries",
        "https://www.postgresql.org/",
    ),
    (
        "mysql",
        "MySQL database and client libraries",
        "https://www.mysql.com/",
    ),
    (
        "openssl",
        "Cryptography and SSL/TLS toolkit",
        "https://www.openssl.org/",
    ),
];

/// Canonical DepURL for a package name, if it is a known one.
pub fn depurl_for(package: &str) -> Option<&'static str> {
    PACKAGE_DEPURLS
        .iter()
        .find(|(name, _)| *name == package)
        .map(|(_, depurl)| *depurl)
}

/// Install recipes for a simple name, if known.
pub fn install_recipes_for(simple_name: &str) -> Option<&'static [InstallRecipe]> {
    INSTALL_RECIPES
        .iter()
        .find(|(name, _)| *name == simple_name)
        .map(|(_, recipes)| *recipes)
}

/// Rationale and URL for a simple name, if known.
pub fn metadata_for(simple_name: &str) -> Option<(&'static str, &'static str)> {
    PACKAGE_METADATA
        .iter()
        .find(|(name, _, _)| *name == simple_name)
        .map(|(_, rationale, url)| (*rationale, *url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depurl;

    #[test]
    fn lookups_resolve_known_packages() {
        assert_eq!(depurl_for("ffmpeg"), Some("dep:generic/ffmpeg"));
        assert_eq!(depurl_for("gcc"), Some("dep:virtual/compiler/c"));
        assert_eq!(depurl_for("no-such-package"), None);
        assert!(install_recipes_for("unixodbc").is_some());
        assert!(metadata_for("git").is_some());
    }

    #[test]
    fn every_mapped_depurl_is_valid() {
        for (package, mapped) in PACKAGE_DEPURLS {
            assert!(depurl::is_valid(mapped), "bad DepURL for {package}: {mapped}");
        }
    }

    #[test]
    fn recipe_and_metadata_keys_are_simple_names() {
        for (name, _) in INSTALL_RECIPES {
            assert!(!name.contains('/'), "recipe key should be a simple name: {name}");
        }
        for (name, _, _) in PACKAGE_METADATA {
            assert!(!name.contains('/'), "metadata key should be a simple name: {name}");
        }
    }
}
