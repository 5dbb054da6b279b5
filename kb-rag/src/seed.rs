//! The static company corpus loaded at process start.

use chrono::{DateTime, Utc};

use crate::document::{Category, Document, DocumentMetadata};

/// 2024-06-01T00:00:00Z, the revision date of the seeded texts.
const SEED_REVISION: i64 = 1_717_200_000;

fn entry(
    id: &str,
    title: &str,
    category: Category,
    keywords: &[&str],
    priority: i32,
    content: &str,
) -> Document {
    let metadata = DocumentMetadata {
        last_updated: DateTime::<Utc>::from_timestamp(SEED_REVISION, 0).unwrap_or_default(),
        source: "website".to_string(),
        priority,
    };
    Document::new(id, title, content, category)
        .with_keywords(keywords.iter().copied())
        .with_metadata(metadata)
}

/// The documents every engine starts with, in display order.
pub fn seed_documents() -> Vec<Document> {
    vec![
        entry(
            "company-overview",
            "Giới thiệu công ty",
            Category::Company,
            &["công ty", "giới thiệu", "lịch sử", "phần mềm"],
            3,
            "Chúng tôi là công ty phát triển phần mềm quản trị doanh nghiệp được thành lập năm 2012 \
             tại Hà Nội. Sau hơn mười năm hoạt động, công ty đã phục vụ hơn 1.200 khách hàng \
             trong các lĩnh vực sản xuất, phân phối và bán lẻ. Đội ngũ gồm hơn 150 kỹ sư và \
             chuyên gia tư vấn giàu kinh nghiệm.",
        ),
        entry(
            "company-mission",
            "Tầm nhìn và sứ mệnh",
            Category::Company,
            &["tầm nhìn", "sứ mệnh", "giá trị cốt lõi"],
            2,
            "Sứ mệnh của chúng tôi là giúp doanh nghiệp Việt Nam chuyển đổi số với chi phí hợp lý. \
             Tầm nhìn đến năm 2030 là trở thành nhà cung cấp giải pháp quản trị hàng đầu khu vực \
             Đông Nam Á. Giá trị cốt lõi: tận tâm, sáng tạo, minh bạch.",
        ),
        entry(
            "erp-product",
            "Phần mềm ERP",
            Category::Product,
            &["erp", "quản trị doanh nghiệp", "kế toán", "kho", "bảng giá"],
            5,
            "Phần mềm ERP tích hợp toàn bộ nghiệp vụ kế toán, mua hàng, bán hàng, kho vận và sản \
             xuất trên một nền tảng duy nhất. Hệ thống chạy trên nền web và ứng dụng di động, hỗ \
             trợ nhiều chi nhánh và nhiều đơn vị tiền tệ. Giá gói cơ bản từ 5.000.000 VNĐ mỗi \
             tháng cho 10 người dùng. Gói nâng cao có giá 12.000.000 VNĐ mỗi tháng và bao gồm \
             module sản xuất. Khách hàng được dùng thử miễn phí 30 ngày.",
        ),
        entry(
            "crm-product",
            "Phần mềm CRM",
            Category::Product,
            &["crm", "khách hàng", "bán hàng", "chăm sóc khách hàng"],
            4,
            "Hệ thống CRM giúp quản lý thông tin khách hàng, theo dõi cơ hội bán hàng và lịch sử \
             chăm sóc. Đội kinh doanh có thể phân công đầu mối, đặt lịch nhắc hẹn và xem báo cáo \
             doanh số theo thời gian thực. Tích hợp sẵn email, tổng đài và Zalo OA.",
        ),
        entry(
            "hrm-product",
            "Phần mềm quản lý nhân sự",
            Category::Product,
            &["hrm", "nhân sự", "chấm công", "tính lương"],
            4,
            "Phần mềm nhân sự quản lý hồ sơ nhân viên, chấm công bằng khuôn mặt và tính lương tự \
             động theo quy định bảo hiểm hiện hành. Nhân viên xem phiếu lương và gửi đơn nghỉ \
             phép ngay trên điện thoại.",
        ),
        entry(
            "pricing-policy",
            "Bảng giá và chính sách thanh toán",
            Category::Product,
            &["bảng giá", "thanh toán", "chiết khấu"],
            3,
            "Bảng giá được niêm yết theo tháng và theo năm. Thanh toán trước 12 tháng được chiết \
             khấu 15%. Chúng tôi chấp nhận chuyển khoản ngân hàng và thẻ quốc tế. Hóa đơn điện tử \
             được gửi trong vòng 3 ngày làm việc.",
        ),
        entry(
            "website-service",
            "Thiết kế website",
            Category::Service,
            &["website", "thiết kế", "thương mại điện tử", "seo"],
            3,
            "Dịch vụ thiết kế website chuẩn SEO, tối ưu cho thiết bị di động. Chúng tôi xây dựng \
             cả trang giới thiệu doanh nghiệp lẫn website thương mại điện tử có giỏ hàng và cổng \
             thanh toán trực tuyến. Thời gian hoàn thành từ 3 đến 6 tuần.",
        ),
        entry(
            "mobile-app-service",
            "Phát triển ứng dụng di động",
            Category::Service,
            &["ứng dụng", "di động", "ios", "android"],
            2,
            "Chúng tôi phát triển ứng dụng di động đa nền tảng cho iOS và Android. Quy trình gồm \
             khảo sát yêu cầu, thiết kế giao diện, lập trình, kiểm thử và đưa ứng dụng lên kho. \
             Sau khi bàn giao, khách hàng được bảo trì miễn phí 6 tháng.",
        ),
        entry(
            "implementation-service",
            "Triển khai và đào tạo",
            Category::Service,
            &["triển khai", "đào tạo", "chuyển đổi dữ liệu", "tư vấn"],
            3,
            "Đội ngũ tư vấn khảo sát quy trình, cấu hình hệ thống và chuyển đổi dữ liệu từ phần \
             mềm cũ. Mỗi dự án có quản lý dự án riêng. Người dùng được đào tạo trực tiếp tại văn \
             phòng hoặc trực tuyến, kèm tài liệu hướng dẫn chi tiết.",
        ),
        entry(
            "support-warranty",
            "Bảo hành và hỗ trợ kỹ thuật",
            Category::Support,
            &["bảo hành", "hỗ trợ", "kỹ thuật", "sự cố"],
            4,
            "Tất cả sản phẩm được bảo hành và cập nhật miễn phí trong thời gian sử dụng dịch vụ. \
             Bộ phận hỗ trợ kỹ thuật làm việc từ 8 giờ đến 21 giờ mỗi ngày, kể cả cuối tuần. Sự \
             cố nghiêm trọng được phản hồi trong vòng 30 phút.",
        ),
        entry(
            "support-faq",
            "Câu hỏi thường gặp",
            Category::Support,
            &["faq", "câu hỏi", "dữ liệu", "bảo mật"],
            2,
            "Dữ liệu khách hàng được lưu trữ tại trung tâm dữ liệu đạt chuẩn Tier 3 ở Việt Nam và \
             sao lưu hằng ngày. Bạn có thể xuất toàn bộ dữ liệu ra Excel bất cứ lúc nào. Hệ thống \
             hỗ trợ đăng nhập hai lớp và phân quyền chi tiết đến từng chức năng.",
        ),
        entry(
            "contact-info",
            "Thông tin liên hệ",
            Category::Contact,
            &["liên hệ", "địa chỉ", "hotline", "email"],
            3,
            "Trụ sở chính: tầng 9, số 18 đường Duy Tân, quận Cầu Giấy, Hà Nội. Chi nhánh phía Nam: \
             số 25 đường Nguyễn Thị Minh Khai, Quận 1, TP. Hồ Chí Minh. Hotline 1900 6868, email \
             lienhe@congty.vn. Văn phòng làm việc từ thứ Hai đến thứ Bảy.",
        ),
    ]
}
