#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    blind_relay::rocket().launch().await?;
    Ok(())
}
