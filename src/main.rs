fn main() -> anyhow::Result<()> {
    stridekeep_lib::run()
}
