//! Test fixtures shared by the orchestrator test suites

/// Standard script bodies and expected output
pub struct TestFixtures;

#[allow(dead_code)]
impl TestFixtures {
    /// Fake tool names, relative to the project root
    pub const COMPILER: &'static str = "node_modules/.bin/babel";
    pub const BUNDLER: &'static str = "node_modules/.bin/browserify";
    pub const TEST_RUNNER: &'static str = "node_modules/.bin/mocha-phantomjs";
    pub const BROWSER: &'static str = "node_modules/phantomjs-prebuilt/bin/phantomjs";

    /// Spec files created in `test/specs`
    pub const SPECS: [&'static str; 2] = ["b.spec.js", "a.spec.js"];

    /// Tool body that succeeds silently
    pub const SUCCEED: &'static str = "exit 0";

    /// Success lines of the five build/test stages, in pipeline order
    pub fn build_success_lines() -> Vec<String> {
        [
            "Finished compiling source files",
            "Finished compiling test files",
            "Finished bundling source files successfully",
            "Finished bundling test files successfully",
            "Finished testing successfully",
        ]
        .map(String::from)
        .to_vec()
    }
}
