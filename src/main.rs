fn main() {
    outbreak_dashboard::run_app();
}
