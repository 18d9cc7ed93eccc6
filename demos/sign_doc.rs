use pdf_stamp_signing::{HttpSigningClient, SecretString, SignerConfig, SigningSession, Upload};
use std::{fs::File, io::Write, path::Path};

// Usage: cargo run --example sign_doc -- <document.pdf> <private_key.pem> <user_id>
// The key password is read from `PDF_SIGNER_PASSWORD`.
fn main() {
    let args: Vec<String> = std::env::args().collect();
    let pdf_path = args.get(1).map(String::as_str).unwrap_or("./demos/assets/document.pdf");
    let key_path = args.get(2).map(String::as_str).unwrap_or("./demos/assets/pkcs8.pem");
    let user_id = args.get(3).map(String::as_str).unwrap_or("9");
    let password = std::env::var("PDF_SIGNER_PASSWORD").unwrap_or_default();

    let config = SignerConfig::from_env().unwrap();
    let client = HttpSigningClient::new(&config).unwrap();
    let mut session = SigningSession::new(config);

    let pdf_file_name = Path::new(pdf_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document.pdf")
        .to_owned();
    let surface = session
        .open(Upload::new(pdf_file_name.clone(), std::fs::read(pdf_path).unwrap()))
        .unwrap();

    // Click in the middle of the first page as it is rendered at the current zoom.
    let view = surface.render_page(1, surface.scale()).unwrap();
    let anchor = session
        .select(1, view.width / 2.0, view.height / 2.0, view.width, view.height)
        .unwrap();
    println!(
        "Stamp on page {} at ({:.3}, {:.3}).",
        anchor.page(),
        anchor.x(),
        anchor.y()
    );

    let credential = Upload::new("pkcs8.pem", std::fs::read(key_path).unwrap());
    let signed = session
        .sign(&client, credential, SecretString::from(password), user_id)
        .unwrap();

    let result_name = signed.download_name(&pdf_file_name);
    let mut pdf_file = File::create(format!("./demos/{}", result_name)).unwrap();
    pdf_file.write_all(signed.bytes()).unwrap();
    println!("Saved ./demos/{}", result_name);
}
