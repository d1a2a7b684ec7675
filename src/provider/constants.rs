pub mod sglang {
    pub const API_URL_ENV_VAR: &str = "SGLANG_API_URL";
    pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
    pub const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
    pub const COMPLETIONS_ENDPOINT: &str = "/completions";
    /// Native endpoint, relative to the server root rather than the `/v1` base.
    pub const GENERATE_ENDPOINT: &str = "/generate";
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;
    pub const DEFAULT_TEMPERATURE: f32 = 0.0;
}
