//! Integration tests for config

#[cfg(test)]
mod tests {
    use kiln_config::*;
    use kiln_types::BuildTarget;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 6] = [
        "KILN_BUILD_TARGET",
        "KILN_CMAKE_BUILD_SYSTEM",
        "KILN_CMAKE_BINARY",
        "KILN_MAKE_BINARY",
        "KILN_INSTALL_PYC",
        "KILN_BUILD_THREADS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_cmake_defaults() {
        let config = Config::default();
        assert_eq!(config.cmake.build_target, BuildTarget::Release);
        assert_eq!(config.cmake.generator(), None);
        assert_eq!(
            config.cmake.cmake_args,
            vec![
                "-Wno-dev",
                "-DCMAKE_ECLIPSE_GENERATE_SOURCE_PROJECT=TRUE",
                "-D_ECLIPSE_VERSION=4.3",
                "--no-warn-unused-cli",
            ]
        );
        assert!(config.cmake.cmake_binary.is_none());
        assert!(config.cmake.make_binary().is_none());
        assert!(config.cmake.install_pyc);
        assert_eq!(config.build.prompt, "BUILD>");
        assert!(!config.compat.central_define_enabled());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[cmake]
build_target = "Debug"
build_system = "Ninja"
cmake_args = ["-DFOO=1"]
make_binary = "make"
install_pyc = false

[build]
thread_count = 6

[paths]
cmake_files_dir = "/srv/kiln/cmake"

[compat]
cmake_variables = true
disabled = false
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.cmake.build_target, BuildTarget::Debug);
        assert_eq!(config.cmake.generator(), Some("Ninja"));
        assert_eq!(config.cmake.cmake_args, vec!["-DFOO=1"]);
        assert_eq!(config.cmake.make_binary(), Some("make"));
        assert!(!config.cmake.install_pyc);
        assert_eq!(config.build_thread_count(), 6);
        assert_eq!(config.cmake_files_dir(), PathBuf::from("/srv/kiln/cmake"));
        assert!(config.compat.central_define_enabled());
    }

    #[test]
    fn test_invalid_build_target_in_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[cmake]\nbuild_target = \"Fastest\"").unwrap();

        assert!(Config::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/kiln.toml"))
            .unwrap_err();
        assert!(matches!(
            err,
            kiln_errors::Error::Config(kiln_errors::ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("KILN_BUILD_TARGET", "RelWithDebInfo");
        std::env::set_var("KILN_CMAKE_BUILD_SYSTEM", "make");
        std::env::set_var("KILN_INSTALL_PYC", "0");
        std::env::set_var("KILN_BUILD_THREADS", "3");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.cmake.build_target, BuildTarget::RelWithDebInfo);
        assert_eq!(config.cmake.generator(), Some("make"));
        assert!(!config.cmake.install_pyc);
        assert_eq!(config.build_thread_count(), 3);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("KILN_BUILD_TARGET", "invalid");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[test]
    fn test_auto_thread_count_is_positive() {
        assert!(calculate_build_jobs(0) >= 1);
        assert_eq!(calculate_build_jobs(12), 12);
    }
}
