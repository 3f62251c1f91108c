use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    bot_console::run().await
}
