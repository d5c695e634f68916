use mongodb::{options::ClientOptions, Client, Database};

/// Database name is the last path segment of the URI, `event_booking` otherwise.
pub fn database_name(uri: &str) -> &str {
    uri.rsplit('/')
        .next()
        .map(|segment| segment.split('?').next().unwrap_or(segment))
        .filter(|name| !name.is_empty() && !name.contains([':', '@', '.']))
        .unwrap_or("event_booking")
}

pub async fn init_db(uri: &str, app_name: &str) -> mongodb::error::Result<Database> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some(app_name.to_string());

    let client = Client::with_options(client_options)?;
    Ok(client.database(database_name(uri)))
}
