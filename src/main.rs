fn main() {
    kpi_dashboard_lib::run()
}
