use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub upload_path: String,
    pub db_path: String,
    pub api_type: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_api_model: String,
    pub azure_api_key: String,
    pub azure_instance_name: String,
    pub azure_api_version: String,
    pub azure_deployment_name: String,
    pub azure_embedding_deployment_name: String,
    pub system_message: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("DOCCHAT_STORAGE_PATH").unwrap_or("./".to_string());
        let upload_path = env::var("DOCCHAT_UPLOAD_PATH")
            .unwrap_or_else(|_| format!("{}/uploads", storage_path.trim_end_matches("/")));
        let db_path = format!("{}/db", storage_path.trim_end_matches("/"));
        let api_type = env::var("OPENAI_TYPE").unwrap_or_else(|_| "OPENAI".to_string());
        let openai_api_hostname = env::var("DOCCHAT_OPENAI_API_HOSTNAME")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        let openai_api_model =
            env::var("OPENAI_API_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let azure_api_key = env::var("AZURE_OPENAI_API_KEY").unwrap_or_default();
        let azure_instance_name = env::var("AZURE_OPENAI_API_INSTANCE_NAME").unwrap_or_default();
        let azure_api_version =
            env::var("AZURE_OPENAI_API_VERSION").unwrap_or_else(|_| "2023-05-15".to_string());
        let azure_deployment_name =
            env::var("AZURE_OPENAI_API_DEPLOYMENT_NAME").unwrap_or_default();
        let azure_embedding_deployment_name =
            env::var("AZURE_OPENAI_API_EMBEDDINGS_DEPLOYMENT_NAME").unwrap_or_default();
        let system_message = env::var("DOCCHAT_SYSTEM_MESSAGE").unwrap_or_else(|_| {
            "The following is a friendly conversation between a human and an AI. \
             The AI is talkative and provides lots of specific details from its \
             context. If the AI does not know the answer to a question, it \
             truthfully says it does not know."
                .to_string()
        });

        Self {
            storage_path,
            upload_path,
            db_path,
            api_type,
            openai_api_hostname,
            openai_api_key,
            openai_api_model,
            azure_api_key,
            azure_instance_name,
            azure_api_version,
            azure_deployment_name,
            azure_embedding_deployment_name,
            system_message,
        }
    }
}
