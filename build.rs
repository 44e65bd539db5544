#[cfg(windows)]
fn main() {
    let mut res = winres::WindowsResource::new();
    if std::path::Path::new("icons/icon.ico").exists() {
        res.set_icon("icons/icon.ico");
    }
    res.set("ProductName", "LumaScreen");
    res.set("FileDescription", "LumaScreen - Virtual Ring Light");
    res.set("LegalCopyright", "© 2025 LumaScreen Contributors");
    res.set("CompanyName", "LumaScreen");
    res.set("OriginalFilename", "lumascreen.exe");

    if let Err(e) = res.compile() {
        eprintln!("Failed to compile Windows resource: {}", e);
    }
}

#[cfg(not(windows))]
fn main() {
}
