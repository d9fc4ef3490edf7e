use crate::core::config::data::{path_display, Config};
use crate::core::config::resolve::{mask_secret, Overrides, DEFAULT_BACKEND_URL, ENV_API_KEY};

impl Config {
    pub fn print_all<F>(&self, overrides: &Overrides, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match Config::get_config_path() {
            Some(path) => println!("Configuration file: {}", path_display(path)),
            None => println!("Configuration file: (no config directory)"),
        }
        println!("Current configuration:");
        for line in self.describe(overrides, env) {
            println!("  {line}");
        }
    }

    /// Effective settings as `key: value` lines, secrets masked.
    pub fn describe<F>(&self, overrides: &Overrides, env: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut lines = Vec::new();
        let client = self.client_settings(overrides, &env);
        match self.server_settings(overrides, &env) {
            Ok(server) => {
                lines.push(format!("api-key: {}", mask_secret(&server.api_key)));
                lines.push(format!("model: {}", server.model));
                lines.push(format!("api-base-url: {}", server.api_base_url));
                lines.push(format!("port: {}", server.port));
            }
            Err(err) => {
                lines.push(format!("api-key: (unset, {ENV_API_KEY})"));
                lines.push(format!("server: {err}"));
                match self.listen_port(overrides, &env) {
                    Ok(port) => lines.push(format!("port: {port}")),
                    Err(port_err) => lines.push(format!("port: {port_err}")),
                }
            }
        }
        if client.backend_url == DEFAULT_BACKEND_URL {
            lines.push(format!("backend-url: {} (default)", client.backend_url));
        } else {
            lines.push(format!("backend-url: {}", client.backend_url));
        }
        lines.push(format!("frame-mode: {}", client.frame_mode));
        lines.push(format!("code-language: {}", client.code_language));

        let generation = &self.generation;
        lines.push("generation:".to_string());
        lines.push(format!("  temperature: {}", generation.temperature));
        lines.push(format!("  top-p: {}", generation.top_p));
        lines.push(format!("  top-k: {}", generation.top_k));
        lines.push(format!("  max-output-tokens: {}", generation.max_output_tokens));
        lines.push(format!("  response-mime-type: {}", generation.response_mime_type));
        lines
    }
}
