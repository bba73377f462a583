mod shell;

fn main() -> Result<(), eframe::Error> {
    shell::run()
}
